use std::fs;
use std::path::{Path, PathBuf};

use occ_core::errors::{ErrorInfo, OccError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::certificate::Certificate;
use crate::context::AuditContext;
use crate::kind::CertKind;
use crate::outcome::{CertificateOutcome, Validation};
use crate::validate::validate;

/// Reads a JSON certificate file.
pub fn load_certificate(path: &Path) -> Result<Certificate, OccError> {
    let bytes = fs::read(path).map_err(|err| OccError::io("cert-read", path, err))?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|err| {
        OccError::Serde(ErrorInfo::new("cert-parse", err.to_string()).with_context("path", path.display().to_string()))
    })?;
    Certificate::from_value(value)
}

/// Writes a certificate back as pretty JSON, e.g. after hash slots were filled.
pub fn store_certificate(path: &Path, cert: &Certificate) -> Result<(), OccError> {
    let mut text = serde_json::to_string_pretty(cert)
        .map_err(|err| OccError::Serde(ErrorInfo::new("cert-encode", err.to_string())))?;
    text.push('\n');
    fs::write(path, text).map_err(|err| OccError::io("cert-write", path, err))
}

/// Where a declared certificate comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CertificateSource {
    /// Certificate embedded in the request.
    Inline {
        /// Certificate body.
        certificate: Certificate,
    },
    /// JSON file; relative paths resolve against the audit code root.
    Path {
        /// Location of the file.
        path: PathBuf,
    },
}

fn default_enabled() -> bool {
    true
}

/// One entry of a request's certificate block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateDeclaration {
    /// Disabled certificates are reported as `SKIP`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Kind to validate as; defaults to the kind named by the entry key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CertKind>,
    /// Store the audited certificate back over a path source when
    /// validation changed it.
    #[serde(default, skip_serializing_if = "is_false")]
    pub write_back: bool,
    /// Certificate body or file.
    #[serde(flatten)]
    pub source: CertificateSource,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl CertificateDeclaration {
    /// Enabled inline declaration.
    pub fn inline(kind: CertKind, certificate: Certificate) -> Self {
        Self {
            enabled: true,
            kind: Some(kind),
            write_back: false,
            source: CertificateSource::Inline { certificate },
        }
    }

    /// Enabled file declaration.
    pub fn from_path(kind: CertKind, path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            kind: Some(kind),
            write_back: false,
            source: CertificateSource::Path { path: path.into() },
        }
    }

    /// Same declaration, storing audited certificates back to the file.
    pub fn writing_back(mut self) -> Self {
        self.write_back = true;
        self
    }

    /// Same declaration, disabled.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Explicit kind, or the kind named by `name` (`PA`, `IO`, `RFS`).
    pub fn resolve_kind(&self, name: &str) -> Result<CertKind, OccError> {
        if let Some(kind) = self.kind {
            return Ok(kind);
        }
        name.parse().map_err(|err: crate::kind::UnknownCertKind| {
            OccError::Config(
                ErrorInfo::new("cert-kind", err.to_string())
                    .with_context("certificate", name)
                    .with_hint("set `kind` on the declaration"),
            )
        })
    }

    /// File location of a path source, resolved against `code_root`.
    pub fn resolved_path(&self, code_root: &Path) -> Option<PathBuf> {
        match &self.source {
            CertificateSource::Inline { .. } => None,
            CertificateSource::Path { path } => Some(resolve(code_root, path)),
        }
    }

    /// Certificate body, loading it from disk for path sources.
    pub fn load(&self, code_root: &Path) -> Result<Certificate, OccError> {
        match &self.source {
            CertificateSource::Inline { certificate } => Ok(certificate.clone()),
            CertificateSource::Path { path } => load_certificate(&resolve(code_root, path)),
        }
    }
}

fn resolve(code_root: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        code_root.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Validates one declared certificate. Disabled entries are skipped without
/// touching the source.
///
/// When validation changes the certificate the audited copy rides on the
/// outcome, and is also stored for `write_back` path declarations.
pub fn validate_declared(
    name: &str,
    declaration: &CertificateDeclaration,
    ctx: &AuditContext,
) -> Result<CertificateOutcome, OccError> {
    if !declaration.enabled {
        debug!(certificate = name, "certificate disabled");
        return Ok(CertificateOutcome::skipped("certificate disabled"));
    }
    let kind = declaration.resolve_kind(name)?;
    let cert = declaration.load(&ctx.code_root)?;
    let Validation {
        outcome,
        certificate,
    } = validate(&cert, kind, ctx)?;
    if certificate == cert {
        return Ok(outcome);
    }
    if declaration.write_back {
        if let Some(path) = declaration.resolved_path(&ctx.code_root) {
            store_certificate(&path, &certificate)?;
            debug!(certificate = name, path = %path.display(), "audited certificate stored");
        }
    }
    Ok(outcome.with_certificate(certificate))
}
