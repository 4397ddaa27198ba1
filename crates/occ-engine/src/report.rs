use std::collections::BTreeMap;

use occ_audit::to_canonical_json_bytes;
use occ_cert::CertificateOutcome;
use occ_core::{LockMap, OccError, Reason, Verdict};
use serde::Serialize;

use crate::sweep::Stability;

/// Result of one top-level evaluation, shaped like the report JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalReport {
    /// Combined verdict after any stability downgrade.
    pub verdict: Verdict,
    /// Wire reason code; empty for `PASS`.
    pub first_reason: Reason,
    /// Locks of the baseline run in declared order.
    pub locks: LockMap,
    /// Module diagnostics followed by engine notes.
    pub diagnostic: Vec<String>,
    /// Outcome per declared certificate.
    pub certificates: BTreeMap<String, CertificateOutcome>,
    /// PCN/PCD results when sweeps ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<Stability>,
    /// Canonical hash of the evaluated configuration.
    pub input_hash: String,
}

impl FinalReport {
    /// `cert:…`, `lock:…` or `sweep:…` form of the first reason.
    pub fn qualified_reason(&self) -> String {
        self.first_reason.qualified()
    }

    /// Canonical JSON encoding, stable across runs with identical inputs.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, OccError> {
        to_canonical_json_bytes(self)
    }
}
