use std::fs::File;
use std::io::Read;
use std::path::Path;

use occ_core::errors::OccError;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical::to_canonical_json_bytes;

/// Read size used when streaming files through the hasher.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Prefix carried by every stored digest.
pub const DIGEST_PREFIX: &str = "sha256:";

/// Hex SHA-256 of a byte slice.
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Hex SHA-256 of a file, read in [`CHUNK_SIZE`] chunks.
pub fn hash_file(path: &Path) -> Result<String, OccError> {
    let mut file = File::open(path).map_err(|err| OccError::io("hash-file-open", path, err))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buffer)
            .map_err(|err| OccError::io("hash-file-read", path, err))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hex SHA-256 of the canonical JSON encoding of `value`.
///
/// Structurally equal values hash identically regardless of the order their
/// object keys were inserted in.
pub fn hash_canonical_value<T: Serialize>(value: &T) -> Result<String, OccError> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(hash_bytes(&bytes))
}

/// Returns `sha256:<hex>`.
pub fn prefixed(hex_digest: &str) -> String {
    format!("{DIGEST_PREFIX}{hex_digest}")
}
