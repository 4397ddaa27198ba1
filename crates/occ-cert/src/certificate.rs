use occ_core::errors::{ErrorInfo, OccError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::kind::CertKind;

fn cert_error(code: &str, message: impl Into<String>) -> OccError {
    OccError::Schema(ErrorInfo::new(code, message.into()))
}

/// Certificate exactly as supplied at the system boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Certificate {
    fields: Map<String, Value>,
}

impl Certificate {
    /// Wraps a JSON object. Non-object payloads are rejected.
    pub fn from_value(value: Value) -> Result<Self, OccError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(cert_error(
                "cert-not-object",
                format!("certificate must be a JSON object, got {}", json_type(&other)),
            )),
        }
    }

    /// Wraps an already-built field map.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Mutable raw fields, for callers assembling certificates by hand.
    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// Field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Raw `cert_type` value when it is a string.
    pub fn cert_type(&self) -> Option<&str> {
        self.fields.get("cert_type").and_then(Value::as_str)
    }

    /// Kind named by `cert_type`, if recognised.
    pub fn declared_kind(&self) -> Option<CertKind> {
        self.cert_type().and_then(CertKind::from_type_tag)
    }

    /// Required fields of `kind` absent from this certificate, in schema order.
    pub fn missing_fields(&self, kind: CertKind) -> Vec<&'static str> {
        kind.required_fields()
            .iter()
            .copied()
            .filter(|field| !self.fields.contains_key(*field))
            .collect()
    }

    /// JSON object form.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub(crate) fn to_record<T: DeserializeOwned>(&self) -> Result<T, OccError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|err| cert_error("cert-record", err.to_string()))
    }

    pub(crate) fn from_record<T: Serialize>(record: &T) -> Result<Self, OccError> {
        let value = serde_json::to_value(record).map_err(|err| {
            OccError::Serde(ErrorInfo::new("cert-record-encode", err.to_string()))
        })?;
        Self::from_value(value)
    }
}

/// Projection-adequacy certificate after the required-field check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaCertificate {
    /// Type tag, `PA-CERT`.
    pub cert_type: Value,
    /// Certificate schema version.
    pub cert_version: Value,
    /// Version of the projection being certified.
    pub projection_version: Value,
    /// Signature of the projection operator.
    #[serde(rename = "Pi_signature")]
    pub pi_signature: Value,
    /// Assumptions the bound relies on.
    pub assumptions: Value,
    /// How the projection error was estimated.
    pub delta_proj_method: Value,
    /// Projection error block; `delta` holds the error sequence.
    pub delta_proj: Value,
    /// Dominance rule; `kappa` is the margin factor.
    pub kappa_rule: Value,
    /// `code` / `data` provenance digests.
    pub hashes: Value,
    /// Random seeds of the run.
    pub seeds: Value,
    /// Run metadata; stamped with `validated_at_utc`.
    pub run_log: Value,
    /// Data uncertainty; `sigma` is the scale.
    pub sigma_data: Value,
    /// Fields outside the schema, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identifiability certificate after the required-field check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IoCertificate {
    /// Type tag, `IO-CERT`.
    pub cert_type: Value,
    /// Certificate schema version.
    pub cert_version: Value,
    /// Parameter to observable map.
    #[serde(rename = "map_O_theta")]
    pub map_o_theta: Value,
    /// Effective parameters.
    pub theta_effective_list: Value,
    /// Observables the map produces.
    pub observables_list: Value,
    /// Metric block; `value` is compared against the threshold.
    pub identifiability_metric: Value,
    /// Minimum acceptable metric value.
    pub threshold_tau: Value,
    /// Known parameter degeneracies.
    pub degeneracies_list: Value,
    /// Datasets considered equivalent.
    pub dataset_equivalence: Value,
    /// Fields outside the schema, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Resource/fidelity-stability certificate after the required-field check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfsCertificate {
    /// Type tag, `RFS-CERT`.
    pub cert_type: Value,
    /// Certificate schema version.
    pub cert_version: Value,
    /// Compute budget the run stayed within.
    pub resource_budget: Value,
    /// Link to the upstream model run.
    pub isaac_link: Value,
    /// Grid refinement sweep flags.
    pub pcn_sweep: Value,
    /// Tolerance sweep flags.
    pub pcd_sweep: Value,
    /// Idealizations made by the model.
    pub idealizations: Value,
    /// `code` / `data` / `env` provenance digests.
    pub audit_hashes: Value,
    /// Fields outside the schema, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Operands of the PA dominance rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dominance {
    /// Largest projection error.
    pub max_delta: f64,
    /// Margin factor.
    pub kappa: f64,
    /// Data uncertainty scale.
    pub sigma: f64,
}

impl Dominance {
    /// Projection error dominates data uncertainty.
    pub fn dominated(&self) -> bool {
        self.max_delta >= self.kappa * self.sigma
    }
}

impl PaCertificate {
    /// Extracts `max(delta_proj.delta)`, `kappa_rule.kappa` and `sigma_data.sigma`.
    pub fn dominance(&self) -> Result<Dominance, String> {
        let deltas = self
            .delta_proj
            .get("delta")
            .ok_or_else(|| "delta_proj.delta is missing".to_string())?;
        let deltas = deltas
            .as_array()
            .ok_or_else(|| "delta_proj.delta must be a sequence".to_string())?;
        let mut max_delta: Option<f64> = None;
        for (idx, item) in deltas.iter().enumerate() {
            let value = numeric(item).ok_or_else(|| format!("delta_proj.delta[{idx}] is not numeric"))?;
            max_delta = Some(match max_delta {
                Some(current) if current >= value => current,
                _ => value,
            });
        }
        let max_delta = max_delta.ok_or_else(|| "delta_proj.delta is empty".to_string())?;
        let kappa = nested_numeric(&self.kappa_rule, "kappa", "kappa_rule.kappa")?;
        let sigma = nested_numeric(&self.sigma_data, "sigma", "sigma_data.sigma")?;
        Ok(Dominance {
            max_delta,
            kappa,
            sigma,
        })
    }
}

impl IoCertificate {
    /// Extracts `(identifiability_metric.value, threshold_tau)`.
    pub fn identifiability(&self) -> Result<(f64, f64), String> {
        let value = nested_numeric(&self.identifiability_metric, "value", "identifiability_metric.value")?;
        let tau = numeric(&self.threshold_tau).ok_or_else(|| "threshold_tau is not numeric".to_string())?;
        Ok((value, tau))
    }
}

/// `enabled` / `flips` flags of an RFS sweep block.
///
/// Also the summary shape the stability sweeper hands back, so an RFS
/// certificate can be assembled from an engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SweepFlags {
    /// The sweep ran.
    #[serde(default)]
    pub enabled: bool,
    /// Some run changed verdict class.
    #[serde(default)]
    pub flips: bool,
}

impl SweepFlags {
    /// Reads a sweep block; it must be a JSON object.
    pub fn from_block(block: &Value, name: &str) -> Result<Self, String> {
        let map = block
            .as_object()
            .ok_or_else(|| format!("{name} must be an object"))?;
        Ok(Self {
            enabled: map.get("enabled").map(truthy).unwrap_or(false),
            flips: map.get("flips").map(truthy).unwrap_or(false),
        })
    }

    /// Enabled and observed a verdict flip.
    pub fn flipped(&self) -> bool {
        self.enabled && self.flips
    }
}

impl RfsCertificate {
    /// Flags of `pcn_sweep` and `pcd_sweep`.
    pub fn sweeps(&self) -> Result<(SweepFlags, SweepFlags), String> {
        Ok((
            SweepFlags::from_block(&self.pcn_sweep, "pcn_sweep")?,
            SweepFlags::from_block(&self.pcd_sweep, "pcd_sweep")?,
        ))
    }
}

/// Accepts JSON numbers and numeric strings.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn nested_numeric(container: &Value, key: &str, label: &str) -> Result<f64, String> {
    let raw = container
        .get(key)
        .ok_or_else(|| format!("{label} is missing"))?;
    numeric(raw).ok_or_else(|| format!("{label} is not numeric"))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
