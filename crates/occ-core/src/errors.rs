//! Structured error types shared across OCC crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`OccError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, slot names, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the OCC engine.
///
/// Only faults the engine cannot express as a verdict end up here. Schema
/// violations, hash mismatches and unusable numerics inside certificates are
/// reported as `NO-EVAL` verdicts instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum OccError {
    /// Filesystem failures while hashing or loading inputs.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Structurally invalid inputs that cannot be evaluated at all.
    #[error("schema error: {0}")]
    Schema(ErrorInfo),
    /// Digest computation failures.
    #[error("hash error: {0}")]
    Hash(ErrorInfo),
    /// Domain module lookup and execution failures.
    #[error("module error: {0}")]
    Module(ErrorInfo),
    /// Serialization and canonical encoding errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
    /// Invalid engine configuration (globs, policies, pointers).
    #[error("config error: {0}")]
    Config(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl OccError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            OccError::Io(info)
            | OccError::Schema(info)
            | OccError::Hash(info)
            | OccError::Module(info)
            | OccError::Serde(info)
            | OccError::Config(info) => info,
        }
    }

    /// Wraps an [`std::io::Error`] raised while touching `path`.
    pub fn io(code: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        OccError::Io(
            ErrorInfo::new(code, err.to_string())
                .with_context("path", path.display().to_string())
                .with_context("kind", format!("{:?}", err.kind())),
        )
    }
}
