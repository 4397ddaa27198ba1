use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::hash::DIGEST_PREFIX;

const AUTO: &str = "AUTO";
/// Template placeholder shipped in example certificates.
const PLACEHOLDER: &str = "sha256:...";

/// A write-once-or-verify digest slot of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashSlot {
    /// Compute the expected digest and store it.
    Auto,
    /// Previously stored digest that must match the recomputed one.
    Digest(String),
}

impl HashSlot {
    /// Interprets a stored slot value. Empty strings, `AUTO` (any case) and the
    /// `sha256:...` template placeholder all request auto-fill.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(AUTO) || trimmed.starts_with(PLACEHOLDER) {
            HashSlot::Auto
        } else {
            HashSlot::Digest(trimmed.to_string())
        }
    }

    /// Stored representation (`AUTO` or the digest).
    pub fn as_str(&self) -> &str {
        match self {
            HashSlot::Auto => AUTO,
            HashSlot::Digest(digest) => digest,
        }
    }

    /// Whether the slot still awaits a digest.
    pub fn is_auto(&self) -> bool {
        matches!(self, HashSlot::Auto)
    }

    /// Whether the stored digest carries the `sha256:` prefix.
    pub fn is_prefixed(&self) -> bool {
        matches!(self, HashSlot::Digest(digest) if digest.starts_with(DIGEST_PREFIX))
    }
}

impl fmt::Display for HashSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HashSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HashSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|raw| HashSlot::parse(&raw)).unwrap_or(HashSlot::Auto))
    }
}

/// Stored digest disagrees with the recomputed one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{slot} mismatch: cert has {stored}, expected {expected}")]
pub struct HashMismatch {
    /// Dotted slot name, e.g. `hashes.code`.
    pub slot: String,
    /// Digest found in the certificate.
    pub stored: String,
    /// Digest recomputed by the auditor.
    pub expected: String,
}

/// Auto-fills or verifies a slot against `expected`.
///
/// Returns the slot the certificate should hold afterwards. This never
/// mutates its input: callers decide where the filled slot is written.
pub fn fill_or_verify(slot_name: &str, slot: &HashSlot, expected: &str) -> Result<HashSlot, HashMismatch> {
    match slot {
        HashSlot::Auto => {
            debug!(slot = slot_name, digest = expected, "auto-filling audit hash slot");
            Ok(HashSlot::Digest(expected.to_string()))
        }
        HashSlot::Digest(stored) if stored == expected => Ok(slot.clone()),
        HashSlot::Digest(stored) => {
            warn!(slot = slot_name, stored = %stored, expected = expected, "audit hash mismatch");
            Err(HashMismatch {
                slot: slot_name.to_string(),
                stored: stored.clone(),
                expected: expected.to_string(),
            })
        }
    }
}
