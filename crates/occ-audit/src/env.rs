use std::collections::BTreeMap;
use std::process::Command;

use occ_core::errors::OccError;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::hash::hash_canonical_value;

/// Operating system and architecture the engine runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformInfo {
    /// `std::env::consts::OS`.
    pub os: String,
    /// `std::env::consts::ARCH`.
    pub arch: String,
    /// `std::env::consts::FAMILY`.
    pub family: String,
}

impl PlatformInfo {
    /// Platform of the running process.
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            family: std::env::consts::FAMILY.to_string(),
        }
    }
}

/// Runtime environment fingerprint hashed into the `env` audit slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvFingerprint {
    /// Platform triple.
    pub platform: PlatformInfo,
    /// Commit of the working tree, when it is a git checkout.
    #[serde(default)]
    pub git_commit: Option<String>,
    /// Tool and library versions.
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .and_then(|out| {
            if out.status.success() {
                Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|text| !text.is_empty())
}

impl EnvFingerprint {
    /// Fingerprint with only the platform and this crate's version filled in.
    pub fn minimal() -> Self {
        let mut versions = BTreeMap::new();
        versions.insert("occ-audit".to_string(), env!("CARGO_PKG_VERSION").to_string());
        Self {
            platform: PlatformInfo::current(),
            git_commit: None,
            versions,
        }
    }

    /// Queries git and rustc for a full fingerprint.
    pub fn detect() -> Self {
        let mut fingerprint = Self::minimal();
        fingerprint.git_commit = command_output("git", &["rev-parse", "HEAD"]);
        if let Some(rustc) = command_output("rustc", &["--version"]) {
            fingerprint.versions.insert("rustc".to_string(), rustc);
        }
        fingerprint
    }

    /// Records an extra library version.
    pub fn with_version(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.versions.insert(name.into(), version.into());
        self
    }
}

/// Hex digest of `{"fingerprint": {platform, git_commit}, "versions": …}`.
pub fn env_hash(fingerprint: &EnvFingerprint) -> Result<String, OccError> {
    let payload = json!({
        "fingerprint": {
            "platform": fingerprint.platform,
            "git_commit": fingerprint.git_commit,
        },
        "versions": fingerprint.versions,
    });
    hash_canonical_value(&payload)
}

/// UTC timestamp in `YYYY-MM-DDTHH:MM:SSZ` form.
pub fn now_utc_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
