//! First-violation verdict combination.

use std::collections::BTreeMap;

use occ_cert::CertificateOutcome;
use occ_core::{LockMap, Reason, Verdict, VerdictClass};
use serde::{Deserialize, Serialize};

/// Verdict with the reason that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combined {
    /// Final verdict.
    pub verdict: Verdict,
    /// First reason; empty on the wire for `PASS`.
    pub first_reason: Reason,
}

impl Combined {
    /// Unconditional pass.
    pub fn pass() -> Self {
        Self {
            verdict: Verdict::pass(),
            first_reason: Reason::None,
        }
    }
}

/// Folds certificate outcomes and locks into one verdict.
///
/// Priority: any `NO-EVAL` certificate, then any `FAIL` certificate (both in
/// name order), then the first failed lock in declared order. Skipped
/// certificates count as passing.
pub fn combine(certificates: &BTreeMap<String, CertificateOutcome>, locks: &LockMap) -> Combined {
    for wanted in [VerdictClass::NoEval, VerdictClass::Fail] {
        if let Some(name) = certificates
            .iter()
            .find(|(_, outcome)| outcome.class() == wanted)
            .map(|(name, _)| name)
        {
            let code = Reason::Certificate(name.clone());
            let verdict = match wanted {
                VerdictClass::NoEval => Verdict::no_eval(code.wire()),
                _ => Verdict::fail(code.wire()),
            };
            return Combined {
                verdict,
                first_reason: code,
            };
        }
    }

    match locks.first_violation() {
        Some(lock) => Combined {
            verdict: if lock.is_no_eval_class() {
                Verdict::no_eval(lock.id.clone())
            } else {
                Verdict::fail(lock.id.clone())
            },
            first_reason: Reason::Lock(lock.id.clone()),
        },
        None => Combined::pass(),
    }
}
