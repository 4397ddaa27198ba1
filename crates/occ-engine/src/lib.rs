#![deny(missing_docs)]
#![doc = "Evaluation engine for OCC domain modules: the lock contract, first-violation verdict combination and PCN/PCD stability sweeps."]

pub mod combine;
pub mod evaluate;
pub mod module;
pub mod policy;
/// Name-indexed domain module table.
pub mod registry;
/// Final report shape.
pub mod report;
pub mod sweep;

pub use combine::{combine, Combined};
pub use evaluate::{AuditSettings, Engine, Evaluation, EvaluationMode, EvaluationRequest};
pub use module::{default_work_estimate, Artifact, DomainModule, ModuleOutput};
pub use policy::{EnginePolicy, NumericsLayout, StabilityPolicy};
pub use registry::{ModuleRegistry, ModuleRegistryBuilder};
pub use report::FinalReport;
pub use sweep::{
    apply_downgrade, pcd_sweep, pcn_sweep, SkipReason, SkippedRun, Stability, SweepKind, SweepPoint, SweepResult,
    SweepRun,
};
