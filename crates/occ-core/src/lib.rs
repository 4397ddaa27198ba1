#![deny(missing_docs)]
#![doc = "Core verdict algebra, lock records and error types for the OCC verification engine."]

pub mod errors;
pub mod lock;
pub mod verdict;

pub use errors::{ErrorInfo, OccError};
pub use lock::{Lock, LockMap};
pub use verdict::{ParseVerdictError, Reason, StabilityReason, Verdict, VerdictClass};
