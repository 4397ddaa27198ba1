use std::fmt::{self, Display};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Certificate families understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CertKind {
    /// Projection-adequacy certificate.
    Pa,
    /// Identifiability-of-observables certificate.
    Io,
    /// Resource/fidelity-stability certificate.
    Rfs,
}

const PA_REQUIRED: &[&str] = &[
    "cert_type",
    "cert_version",
    "projection_version",
    "Pi_signature",
    "assumptions",
    "delta_proj_method",
    "delta_proj",
    "kappa_rule",
    "hashes",
    "seeds",
    "run_log",
    "sigma_data",
];

const IO_REQUIRED: &[&str] = &[
    "cert_type",
    "cert_version",
    "map_O_theta",
    "theta_effective_list",
    "observables_list",
    "identifiability_metric",
    "threshold_tau",
    "degeneracies_list",
    "dataset_equivalence",
];

const RFS_REQUIRED: &[&str] = &[
    "cert_type",
    "cert_version",
    "resource_budget",
    "isaac_link",
    "pcn_sweep",
    "pcd_sweep",
    "idealizations",
    "audit_hashes",
];

impl CertKind {
    /// All kinds in validation order.
    pub const ALL: [CertKind; 3] = [CertKind::Pa, CertKind::Io, CertKind::Rfs];

    /// Short name (`PA`).
    pub fn as_str(&self) -> &'static str {
        match self {
            CertKind::Pa => "PA",
            CertKind::Io => "IO",
            CertKind::Rfs => "RFS",
        }
    }

    /// Value expected in the `cert_type` field (`PA-CERT`).
    pub fn type_tag(&self) -> &'static str {
        match self {
            CertKind::Pa => "PA-CERT",
            CertKind::Io => "IO-CERT",
            CertKind::Rfs => "RFS-CERT",
        }
    }

    /// Exact, case-sensitive list of required top-level keys.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            CertKind::Pa => PA_REQUIRED,
            CertKind::Io => IO_REQUIRED,
            CertKind::Rfs => RFS_REQUIRED,
        }
    }

    /// Hash slots audited for this kind, with the container field holding them.
    pub fn audit_slots(&self) -> Option<(&'static str, &'static [&'static str])> {
        match self {
            CertKind::Pa => Some(("hashes", &["code", "data"])),
            CertKind::Io => None,
            CertKind::Rfs => Some(("audit_hashes", &["code", "data", "env"])),
        }
    }

    /// Rule code within this kind's namespace.
    pub fn code(&self, rule: u8) -> CertCode {
        CertCode { kind: *self, rule }
    }

    /// Matches a `cert_type` value against the accepted spellings.
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        CertKind::ALL
            .into_iter()
            .find(|kind| tag == kind.type_tag() || tag == kind.as_str())
    }
}

impl Display for CertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unknown certificate kind names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown certificate kind `{0}`; expected PA, IO or RFS")]
pub struct UnknownCertKind(pub String);

impl FromStr for CertKind {
    type Err = UnknownCertKind;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_ascii_uppercase();
        CertKind::from_type_tag(&upper).ok_or_else(|| UnknownCertKind(raw.to_string()))
    }
}

impl Serialize for CertKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CertKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Certificate rule code such as `PA3`.
///
/// Renders bare on the wire; [`CertCode::qualified`] gives `cert:PA3` so the
/// code cannot be mistaken for a lock id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CertCode {
    /// Owning certificate family.
    pub kind: CertKind,
    /// Rule number within the family.
    pub rule: u8,
}

impl CertCode {
    /// `cert:<KIND><rule>`.
    pub fn qualified(&self) -> String {
        format!("cert:{self}")
    }
}

impl Display for CertCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.as_str(), self.rule)
    }
}
