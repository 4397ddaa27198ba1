//! The evaluation pipeline: certificates, compile, check, combine, sweep.

use std::collections::BTreeMap;
use std::path::PathBuf;

use occ_audit::{hash_canonical_value, EnvFingerprint};
use occ_cert::{validate_declared, AuditContext, CertificateDeclaration, CertificateOutcome};
use occ_core::{LockMap, OccError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::combine::{combine, Combined};
use crate::module::DomainModule;
use crate::policy::EnginePolicy;
use crate::registry::ModuleRegistry;
use crate::report::FinalReport;
use crate::sweep::{apply_downgrade, pcd_sweep, pcn_sweep, Stability};

/// Where the hash audit reads code and environment from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSettings {
    /// Root of the source tree hashed into `code` slots; also the base of
    /// relative certificate paths.
    pub code_root: PathBuf,
    /// Tree hash patterns; empty selects the defaults.
    #[serde(default)]
    pub include_globs: Vec<String>,
    /// Environment hashed into `env` slots.
    #[serde(default = "EnvFingerprint::minimal")]
    pub env: EnvFingerprint,
}

impl AuditSettings {
    /// Settings with default globs and a minimal environment.
    pub fn new(code_root: impl Into<PathBuf>) -> Self {
        Self {
            code_root: code_root.into(),
            include_globs: Vec::new(),
            env: EnvFingerprint::minimal(),
        }
    }

    /// Settings whose environment is detected from the running host.
    pub fn detected(code_root: impl Into<PathBuf>) -> Self {
        Self {
            env: EnvFingerprint::detect(),
            ..Self::new(code_root)
        }
    }
}

/// One evaluation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// Registry name of the domain module.
    pub module: String,
    /// Module configuration.
    pub config: Value,
    /// Declared certificates by name.
    #[serde(default)]
    pub certificates: BTreeMap<String, CertificateDeclaration>,
}

/// Whether an evaluation may start stability sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    /// Top-level call.
    Normal,
    /// Run inside a sweep; never sweeps again.
    NestedNoSweep,
}

/// Verdict, locks and diagnostics of one compile-check-combine pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Combined verdict and reason.
    pub combined: Combined,
    /// Locks from the module check.
    pub locks: LockMap,
    /// Module and engine diagnostics.
    pub diagnostic: Vec<String>,
    /// Sweep results, when sweeps ran.
    pub stability: Option<Stability>,
}

/// Evaluates requests against a module registry.
#[derive(Debug, Clone)]
pub struct Engine<'a> {
    registry: &'a ModuleRegistry,
    policy: EnginePolicy,
}

impl<'a> Engine<'a> {
    /// Engine over `registry` with `policy`.
    pub fn new(registry: &'a ModuleRegistry, policy: EnginePolicy) -> Self {
        Self { registry, policy }
    }

    /// Policy in force.
    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Full pipeline for a top-level request.
    pub fn evaluate(&self, request: &EvaluationRequest, audit: &AuditSettings) -> Result<FinalReport, OccError> {
        let module = self.registry.get(&request.module)?;
        let input_hash = hash_canonical_value(&request.config)?;
        debug!(module = %request.module, input_hash = %input_hash, "evaluating request");

        let ctx = AuditContext::new(&audit.code_root, json!({ "input_hash": input_hash }))
            .with_include_globs(audit.include_globs.clone())
            .with_env(audit.env.clone());
        let mut certificates = BTreeMap::new();
        for (name, declaration) in &request.certificates {
            certificates.insert(name.clone(), validate_declared(name, declaration, &ctx)?);
        }

        let evaluation = self.evaluate_with(&**module, &request.config, &certificates, EvaluationMode::Normal)?;
        Ok(FinalReport {
            verdict: evaluation.combined.verdict,
            first_reason: evaluation.combined.first_reason,
            locks: evaluation.locks,
            diagnostic: evaluation.diagnostic,
            certificates,
            stability: evaluation.stability,
            input_hash,
        })
    }

    /// Compile, check and combine `config` with already validated
    /// certificates, sweeping in [`EvaluationMode::Normal`] when the policy
    /// asks for it.
    pub fn evaluate_with(
        &self,
        module: &dyn DomainModule,
        config: &Value,
        certificates: &BTreeMap<String, CertificateOutcome>,
        mode: EvaluationMode,
    ) -> Result<Evaluation, OccError> {
        let artifact = module.compile(config)?;
        let output = module.check(&artifact, config)?;
        let mut combined = combine(certificates, &output.locks);
        let mut diagnostic = output.diagnostic;

        let policy = &self.policy.stability;
        let wants_sweep = combined.verdict.is_pass() || policy.always_record;
        let mut stability = None;
        if mode == EvaluationMode::Normal && policy.enabled && wants_sweep {
            let layout = module.numerics_layout().unwrap_or_else(|| policy.layout.clone());
            let estimate = |cfg: &Value| module.estimate_work(cfg, &layout);
            let nested = |cfg: &Value| {
                self.evaluate_with(module, cfg, certificates, EvaluationMode::NestedNoSweep)
                    .map(|run| run.combined.verdict)
            };
            let sweeps = Stability {
                pcn: pcn_sweep(config, policy, &layout, estimate, nested)?,
                pcd: pcd_sweep(config, policy, &layout, estimate, nested)?,
            };
            for sweep in [&sweeps.pcn, &sweeps.pcd] {
                diagnostic.extend(sweep.notes.iter().map(|note| format!("{}: {note}", sweep.kind)));
            }
            combined = apply_downgrade(combined, &sweeps, &mut diagnostic);
            stability = Some(sweeps);
        }

        Ok(Evaluation {
            combined,
            locks: output.locks,
            diagnostic,
            stability,
        })
    }
}
