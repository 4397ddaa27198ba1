#![deny(missing_docs)]
#![doc = "Reproducibility hashing for the OCC engine: byte, file, tree and canonical value digests, environment fingerprints and write-once-or-verify hash slots."]

pub mod canonical;
/// Runtime environment fingerprinting.
pub mod env;
/// Byte, file and canonical value digests.
pub mod hash;
/// Auto-fill-or-verify digest slots.
pub mod slot;
/// Deterministic file tree hashing.
pub mod tree;

pub use canonical::to_canonical_json_bytes;
pub use env::{env_hash, now_utc_iso, EnvFingerprint, PlatformInfo};
pub use hash::{hash_bytes, hash_canonical_value, hash_file, prefixed, CHUNK_SIZE, DIGEST_PREFIX};
pub use slot::{fill_or_verify, HashMismatch, HashSlot};
pub use tree::{default_include_globs, hash_tree, TreeHash, DEFAULT_INCLUDE_GLOBS};
