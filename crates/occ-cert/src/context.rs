use std::path::PathBuf;

use occ_audit::{env_hash, hash_canonical_value, hash_tree, prefixed, EnvFingerprint};
use occ_core::errors::{ErrorInfo, OccError};
use serde_json::Value;

/// Inputs the hash audit recomputes expected digests from.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditContext {
    /// Root of the evaluation engine's source tree (`code` slot).
    pub code_root: PathBuf,
    /// Patterns selecting the hashed files; empty means the defaults.
    pub include_globs: Vec<String>,
    /// Context object hashed into the `data` slot.
    pub data: Value,
    /// Environment hashed into the `env` slot.
    pub env: EnvFingerprint,
}

impl AuditContext {
    /// Context with default globs and a minimal environment fingerprint.
    pub fn new(code_root: impl Into<PathBuf>, data: Value) -> Self {
        Self {
            code_root: code_root.into(),
            include_globs: Vec::new(),
            data,
            env: EnvFingerprint::minimal(),
        }
    }

    /// Replaces the include patterns.
    pub fn with_include_globs(mut self, globs: Vec<String>) -> Self {
        self.include_globs = globs;
        self
    }

    /// Replaces the environment fingerprint.
    pub fn with_env(mut self, env: EnvFingerprint) -> Self {
        self.env = env;
        self
    }

    /// `sha256:` tree hash of the code root.
    pub fn expected_code(&self) -> Result<String, OccError> {
        let tree = hash_tree(&self.code_root, &self.include_globs)?;
        Ok(prefixed(&tree.tree_hash))
    }

    /// `sha256:` canonical hash of the data object.
    pub fn expected_data(&self) -> Result<String, OccError> {
        Ok(prefixed(&hash_canonical_value(&self.data)?))
    }

    /// `sha256:` hash of the environment fingerprint.
    pub fn expected_env(&self) -> Result<String, OccError> {
        Ok(prefixed(&env_hash(&self.env)?))
    }

    /// Expected digest for a named slot.
    pub fn expected(&self, slot: &str) -> Result<String, OccError> {
        match slot {
            "code" => self.expected_code(),
            "data" => self.expected_data(),
            "env" => self.expected_env(),
            other => Err(OccError::Config(ErrorInfo::new(
                "audit-slot",
                format!("no expected digest is defined for slot `{other}`"),
            ))),
        }
    }
}
