//! Content fingerprints for cache keys
//!
//! Same input contents = same fingerprint. Paths are part of the key, so
//! moving a manifest counts as a change too.

use crate::error::{JsDepsError, JsDepsResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// SHA256 content fingerprint, hex encoded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }

    fn from_hasher(hasher: Sha256) -> Self {
        Self(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything whose content can be reduced to a [`Fingerprint`]
pub trait Fingerprinted {
    fn fingerprint(&self) -> JsDepsResult<Fingerprint>;
}

impl Fingerprinted for [PathBuf] {
    fn fingerprint(&self) -> JsDepsResult<Fingerprint> {
        fingerprint_files(self)
    }
}

impl Fingerprinted for Path {
    fn fingerprint(&self) -> JsDepsResult<Fingerprint> {
        fingerprint_files(&[self.to_path_buf()])
    }
}

impl Fingerprinted for [u8] {
    fn fingerprint(&self) -> JsDepsResult<Fingerprint> {
        let mut hasher = Sha256::new();
        hasher.update(self);
        Ok(Fingerprint::from_hasher(hasher))
    }
}

/// Hash a file's contents using SHA256, returning full hex digest
pub fn hash_file_contents(path: &Path) -> JsDepsResult<String> {
    let contents = fs::read(path).map_err(|e| JsDepsError::Io {
        context: format!("reading {}", path.display()),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint a set of files, independent of the order they are given in.
///
/// A missing file contributes an "absent" marker instead of failing, so
/// creating or deleting an input also changes the fingerprint.
pub fn fingerprint_files(paths: &[PathBuf]) -> JsDepsResult<Fingerprint> {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut hasher = Sha256::new();
    for path in sorted {
        hasher.update(path.to_string_lossy().as_bytes());
        hasher.update([0u8]);
        if path.is_file() {
            hasher.update(b"present:");
            hasher.update(hash_file_contents(path)?.as_bytes());
        } else {
            hasher.update(b"absent");
        }
        hasher.update([0u8]);
    }

    Ok(Fingerprint::from_hasher(hasher))
}
