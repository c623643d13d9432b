//! # Key Derivation
//!
//! Maps logical cache keys to file names inside the flat cache root.

use sha2::{Digest, Sha256};

/// Derives on-disk file names from cache keys.
///
/// With hashing enabled the file name is the lowercase hex SHA-256 of the key.
/// With hashing disabled the key is used verbatim; that branch does not
/// sanitize path separators or other characters the filesystem rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDeriver {
    hashing: bool,
}

impl KeyDeriver {
    pub fn new(hashing: bool) -> Self {
        Self { hashing }
    }

    /// Deriver used when hashing is unavailable or disabled
    pub fn raw() -> Self {
        Self { hashing: false }
    }

    pub fn is_hashing(&self) -> bool {
        self.hashing
    }

    pub fn derive_file_name(&self, key: &str) -> String {
        if self.hashing {
            sha256_hex(key)
        } else {
            key.to_owned()
        }
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(true)
    }
}

fn sha256_hex(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}
