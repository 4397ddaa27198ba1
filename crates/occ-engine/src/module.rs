//! Contract between the engine and domain modules.

use occ_core::{LockMap, OccError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::policy::NumericsLayout;

/// Opaque product of [`DomainModule::compile`]; the engine never inspects it.
pub type Artifact = Value;

/// Locks and free-form diagnostics produced by a module check.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleOutput {
    /// Locks in declared order.
    pub locks: LockMap,
    /// Diagnostic lines carried into the final report.
    #[serde(default)]
    pub diagnostic: Vec<String>,
}

impl ModuleOutput {
    /// Output with the given locks and no diagnostics.
    pub fn new(locks: LockMap) -> Self {
        Self {
            locks,
            diagnostic: Vec::new(),
        }
    }

    /// Appends a diagnostic line.
    pub fn with_diagnostic(mut self, line: impl Into<String>) -> Self {
        self.diagnostic.push(line.into());
        self
    }
}

/// A physics or toy computation evaluated by the engine.
///
/// Implementations must be deterministic in `config`: the stability sweeps
/// re-run `compile` and `check` on perturbed copies and compare verdicts.
pub trait DomainModule: Send + Sync {
    /// Registry key.
    fn name(&self) -> &str;

    /// Runs the computation for `config`.
    fn compile(&self, config: &Value) -> Result<Artifact, OccError>;

    /// Evaluates the locks against a compiled artifact.
    fn check(&self, artifact: &Artifact, config: &Value) -> Result<ModuleOutput, OccError>;

    /// Pointers the stability sweeps perturb in this module's configuration.
    ///
    /// `None` uses the layout of the engine's stability policy.
    fn numerics_layout(&self) -> Option<NumericsLayout> {
        None
    }

    /// Cost estimate checked against the work cap before a sweep run.
    ///
    /// `layout` is the layout the sweep runs with. Defaults to
    /// `2 * product of the grid sample counts` it names;
    /// `None` when no grid pointer resolves to a non-negative integer.
    fn estimate_work(&self, config: &Value, layout: &NumericsLayout) -> Option<f64> {
        default_work_estimate(config, layout)
    }
}

/// `2 * product of grid samples` over every resolvable pointer of `layout`.
pub fn default_work_estimate(config: &Value, layout: &NumericsLayout) -> Option<f64> {
    let samples: Vec<u64> = layout
        .grid_samples
        .iter()
        .filter_map(|pointer| config.pointer(pointer).and_then(Value::as_u64))
        .collect();
    if samples.is_empty() {
        return None;
    }
    Some(2.0 * samples.iter().map(|n| *n as f64).product::<f64>())
}
