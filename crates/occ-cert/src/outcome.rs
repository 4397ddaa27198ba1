use std::fmt;

use occ_core::{Verdict, VerdictClass};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::certificate::Certificate;

const SKIP: &str = "SKIP";

/// Whether a certificate was evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateStatus {
    /// Validated, with the resulting verdict.
    Evaluated(Verdict),
    /// Declared but disabled; counts as passing when combined.
    Skipped,
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateStatus::Evaluated(verdict) => verdict.fmt(f),
            CertificateStatus::Skipped => f.write_str(SKIP),
        }
    }
}

impl Serialize for CertificateStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CertificateStatus::Evaluated(verdict) => verdict.serialize(serializer),
            CertificateStatus::Skipped => serializer.serialize_str(SKIP),
        }
    }
}

impl<'de> Deserialize<'de> for CertificateStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw.trim().eq_ignore_ascii_case(SKIP) {
            return Ok(CertificateStatus::Skipped);
        }
        raw.parse().map(CertificateStatus::Evaluated).map_err(D::Error::custom)
    }
}

/// Verdict and note reported for one certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateOutcome {
    /// `PASS(PA)`, `NO-EVAL(PA3)`, `SKIP`, ...
    #[serde(rename = "verdict")]
    pub status: CertificateStatus,
    /// Human readable explanation.
    #[serde(default)]
    pub note: String,
    /// Audited certificate, present when validation changed it (filled
    /// `AUTO` hash slots or stamped `run_log`). Declaring it again in a later
    /// request verifies the recorded digests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
}

impl CertificateOutcome {
    /// Evaluated outcome.
    pub fn evaluated(verdict: Verdict, note: impl Into<String>) -> Self {
        Self {
            status: CertificateStatus::Evaluated(verdict),
            note: note.into(),
            certificate: None,
        }
    }

    /// Disabled certificate.
    pub fn skipped(note: impl Into<String>) -> Self {
        Self {
            status: CertificateStatus::Skipped,
            note: note.into(),
            certificate: None,
        }
    }

    /// Attaches the audited certificate.
    pub fn with_certificate(mut self, certificate: Certificate) -> Self {
        self.certificate = Some(certificate);
        self
    }

    /// Verdict when evaluated.
    pub fn verdict(&self) -> Option<&Verdict> {
        match &self.status {
            CertificateStatus::Evaluated(verdict) => Some(verdict),
            CertificateStatus::Skipped => None,
        }
    }

    /// Class used by the combiner; skipped certificates count as `Pass`.
    pub fn class(&self) -> VerdictClass {
        self.verdict()
            .map(Verdict::class)
            .unwrap_or(VerdictClass::Pass)
    }
}

/// Result of validating one certificate.
///
/// `certificate` is the input with any `AUTO` hash slots filled in; feeding it
/// back into the validator verifies those digests instead of refilling them.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    /// Verdict and note.
    pub outcome: CertificateOutcome,
    /// Certificate as it should be stored after the audit.
    pub certificate: Certificate,
}
