//! Three-valued verdict algebra and first-reason codes.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Qualitative class of a [`Verdict`], ignoring its code.
///
/// The derived ordering is the combination priority: `NoEval` dominates
/// `Fail`, which dominates `Pass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum VerdictClass {
    /// Every check held.
    Pass,
    /// A check was evaluated and violated.
    Fail,
    /// The claim could not be evaluated.
    NoEval,
}

impl Display for VerdictClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerdictClass::Pass => "PASS",
            VerdictClass::Fail => "FAIL",
            VerdictClass::NoEval => "NO-EVAL",
        })
    }
}

/// Outcome of a lock, certificate or full evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Passing verdict, optionally tagged (`PASS(PA)`).
    Pass(Option<String>),
    /// Failing verdict with its reason code (`FAIL(L2)`).
    Fail(String),
    /// Non-evaluable verdict with its reason code (`NO-EVAL(PA3)`).
    NoEval(String),
}

impl Verdict {
    /// Untagged `PASS`.
    pub fn pass() -> Self {
        Verdict::Pass(None)
    }

    /// `PASS(<tag>)`.
    pub fn tagged_pass(tag: impl Into<String>) -> Self {
        Verdict::Pass(Some(tag.into()))
    }

    /// `FAIL(<code>)`.
    pub fn fail(code: impl Into<String>) -> Self {
        Verdict::Fail(code.into())
    }

    /// `NO-EVAL(<code>)`.
    pub fn no_eval(code: impl Into<String>) -> Self {
        Verdict::NoEval(code.into())
    }

    /// Returns the qualitative class of the verdict.
    pub fn class(&self) -> VerdictClass {
        match self {
            Verdict::Pass(_) => VerdictClass::Pass,
            Verdict::Fail(_) => VerdictClass::Fail,
            Verdict::NoEval(_) => VerdictClass::NoEval,
        }
    }

    /// Returns the parenthesised code or tag, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Verdict::Pass(tag) => tag.as_deref(),
            Verdict::Fail(code) | Verdict::NoEval(code) => {
                if code.is_empty() {
                    None
                } else {
                    Some(code.as_str())
                }
            }
        }
    }

    /// Whether the verdict belongs to the `PASS` class.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass(_))
    }

    /// Whether the verdict belongs to the `NO-EVAL` class.
    pub fn is_no_eval(&self) -> bool {
        matches!(self, Verdict::NoEval(_))
    }

    /// Whether two verdicts share a class (`FAIL(X)` and `FAIL(Y)` do).
    pub fn same_class(&self, other: &Verdict) -> bool {
        self.class() == other.class()
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let class = self.class();
        match self.code() {
            Some(code) => write!(f, "{class}({code})"),
            None => write!(f, "{class}"),
        }
    }
}

/// Error returned when a verdict string is not in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised verdict `{0}`; expected PASS, FAIL(<CODE>) or NO-EVAL(<CODE>)")]
pub struct ParseVerdictError(pub String);

impl FromStr for Verdict {
    type Err = ParseVerdictError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text = raw.trim();
        let (head, code) = match text.find('(') {
            Some(open) if text.ends_with(')') => {
                let inner = text[open + 1..text.len() - 1].trim();
                (text[..open].trim(), Some(inner))
            }
            Some(_) => return Err(ParseVerdictError(raw.to_string())),
            None => (text, None),
        };
        let code = code.filter(|inner| !inner.is_empty()).map(str::to_string);
        match head.to_ascii_uppercase().as_str() {
            "PASS" => Ok(Verdict::Pass(code)),
            "FAIL" => Ok(Verdict::Fail(code.unwrap_or_default())),
            "NO-EVAL" | "NO_EVAL" | "NOEVAL" => Ok(Verdict::NoEval(code.unwrap_or_default())),
            _ => Err(ParseVerdictError(raw.to_string())),
        }
    }
}

impl Serialize for Verdict {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Verdict {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(D::Error::custom)
    }
}

/// Stability downgrade reasons emitted by the sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StabilityReason {
    /// A sweep run changed verdict class.
    Unstable,
    /// Sweeps could not cover the required perturbations.
    InsufficientCoverage,
}

impl StabilityReason {
    /// Wire code used inside `NO-EVAL(...)`.
    pub fn code(&self) -> &'static str {
        match self {
            StabilityReason::Unstable => "unstable_under_PCN_or_PCD",
            StabilityReason::InsufficientCoverage => "insufficient_PCN_or_PCD_coverage",
        }
    }
}

/// Namespaced first-reason code attached to a combined verdict.
///
/// The wire form keeps the historical strings; [`Reason::qualified`] renders
/// an unambiguous `namespace:id` form so a certificate code such as `PA3` is
/// never confused with a lock that happens to share the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Reason {
    /// Nothing failed.
    #[default]
    None,
    /// The named certificate gated the verdict.
    Certificate(String),
    /// The lock with this id was the first violation.
    Lock(String),
    /// A stability sweep downgraded the verdict.
    Stability(StabilityReason),
}

const CERT_PREFIX: &str = "CERTS_";

impl Reason {
    /// Historical wire string (`CERTS_PA`, `L2`, `unstable_under_PCN_or_PCD`).
    pub fn wire(&self) -> String {
        match self {
            Reason::None => String::new(),
            Reason::Certificate(name) => format!("{CERT_PREFIX}{name}"),
            Reason::Lock(id) => id.clone(),
            Reason::Stability(reason) => reason.code().to_string(),
        }
    }

    /// Namespaced form (`cert:PA`, `lock:L2`, `sweep:unstable_under_PCN_or_PCD`).
    pub fn qualified(&self) -> String {
        match self {
            Reason::None => String::new(),
            Reason::Certificate(name) => format!("cert:{name}"),
            Reason::Lock(id) => format!("lock:{id}"),
            Reason::Stability(reason) => format!("sweep:{}", reason.code()),
        }
    }

    /// Parses a wire string back into its namespace.
    pub fn from_wire(raw: &str) -> Self {
        if raw.is_empty() {
            return Reason::None;
        }
        if let Some(name) = raw.strip_prefix(CERT_PREFIX) {
            return Reason::Certificate(name.to_string());
        }
        for stability in [
            StabilityReason::Unstable,
            StabilityReason::InsufficientCoverage,
        ] {
            if raw == stability.code() {
                return Reason::Stability(stability);
            }
        }
        Reason::Lock(raw.to_string())
    }
}

impl Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire())
    }
}

impl Serialize for Reason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.wire())
    }
}

impl<'de> Deserialize<'de> for Reason {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Reason::from_wire(&raw))
    }
}
