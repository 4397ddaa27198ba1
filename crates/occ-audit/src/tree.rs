use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use occ_core::errors::{ErrorInfo, OccError};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::hash::{hash_canonical_value, hash_file};

/// Include patterns used when the caller supplies none.
pub const DEFAULT_INCLUDE_GLOBS: &[&str] = &[
    "src/**/*.rs",
    "Cargo.toml",
    "inputs/**/*.yaml",
    "README*.md",
];

fn tree_error(code: &str, message: impl std::fmt::Display) -> OccError {
    OccError::Config(ErrorInfo::new(code, message.to_string()))
}

/// Returns [`DEFAULT_INCLUDE_GLOBS`] as owned strings.
pub fn default_include_globs() -> Vec<String> {
    DEFAULT_INCLUDE_GLOBS.iter().map(|glob| glob.to_string()).collect()
}

/// Deterministic fingerprint of a file tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeHash {
    /// Root the manifest paths are relative to.
    pub root: String,
    /// Patterns that selected the files.
    pub include_globs: Vec<String>,
    /// `(relative path, hex digest)` pairs sorted by path.
    pub manifest: Vec<(String, String)>,
    /// Hash over the canonical encoding of `manifest`.
    pub tree_hash: String,
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, OccError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|err| {
            OccError::Config(
                ErrorInfo::new("tree-glob", err.to_string()).with_context("pattern", pattern.clone()),
            )
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| tree_error("tree-glob-build", err))
}

fn normalise(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Hashes every file under `root` matching `include_globs`.
///
/// The manifest is sorted by relative path before hashing, so the result does
/// not depend on filesystem iteration order. An empty pattern list selects
/// [`DEFAULT_INCLUDE_GLOBS`].
pub fn hash_tree(root: &Path, include_globs: &[String]) -> Result<TreeHash, OccError> {
    let include_globs = if include_globs.is_empty() {
        default_include_globs()
    } else {
        include_globs.to_vec()
    };
    let globset = build_globset(&include_globs)?;
    if !root.is_dir() {
        return Err(OccError::Io(
            ErrorInfo::new("tree-root", "tree root is not a readable directory")
                .with_context("path", root.display().to_string()),
        ));
    }
    let root: PathBuf = root.canonicalize().map_err(|err| OccError::io("tree-root", root, err))?;

    let mut manifest = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry.map_err(|err| {
            OccError::Io(
                ErrorInfo::new("tree-walk", err.to_string())
                    .with_context("root", root.display().to_string()),
            )
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(&root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        if !globset.is_match(rel) {
            continue;
        }
        manifest.push((normalise(rel), hash_file(entry.path())?));
    }
    manifest.sort();
    let tree_hash = hash_canonical_value(&manifest)?;
    Ok(TreeHash {
        root: root.display().to_string(),
        include_globs,
        manifest,
        tree_hash,
    })
}
