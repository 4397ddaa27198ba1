#![deny(missing_docs)]
#![doc = "PA / IO / RFS certificate validation: required-field schemas, hash-chained provenance audits and per-kind semantic rules."]

/// Certificate bodies and their typed views.
pub mod certificate;
/// Expected digests for the hash audit.
pub mod context;
/// Certificate files and request declarations.
pub mod declare;
/// Certificate families and rule codes.
pub mod kind;
/// Verdicts reported per certificate.
pub mod outcome;
/// Validation rules.
pub mod validate;

pub use certificate::{numeric, Certificate, Dominance, IoCertificate, PaCertificate, RfsCertificate, SweepFlags};
pub use context::AuditContext;
pub use declare::{load_certificate, store_certificate, validate_declared, CertificateDeclaration, CertificateSource};
pub use kind::{CertCode, CertKind, UnknownCertKind};
pub use outcome::{CertificateOutcome, CertificateStatus, Validation};
pub use validate::{validate, validate_in_place};
