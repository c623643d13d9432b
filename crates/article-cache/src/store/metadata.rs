//! # Entry Metadata
//!
//! MIME type and ETag stored in a JSON sidecar next to each cached file. A
//! sidecar is written when either is known; a missing or unreadable sidecar
//! means both are unknown.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Suffix appended to an entry file name to name its sidecar
pub const SIDECAR_SUFFIX: &str = ".meta";

/// Metadata attached to a cache entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// MIME type of the cached resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// ETag returned by the origin, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Unix timestamp (seconds) at which the entry was tagged
    pub cached_at: i64,
}

impl EntryMetadata {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            etag: None,
            cached_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Metadata for a downloaded response; `None` when there is nothing to record
    pub fn from_response(mime_type: Option<String>, etag: Option<String>) -> Option<Self> {
        if mime_type.is_none() && etag.is_none() {
            return None;
        }
        Some(Self {
            mime_type,
            etag,
            cached_at: chrono::Utc::now().timestamp(),
        })
    }
}

/// Path of the sidecar belonging to an entry file
pub fn sidecar_path(entry_path: &Path) -> PathBuf {
    let mut name = entry_path.as_os_str().to_owned();
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Attach metadata to an entry, replacing any earlier sidecar
pub fn attach(entry_path: &Path, metadata: &EntryMetadata) -> io::Result<()> {
    let json = serde_json::to_vec(metadata)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let sidecar = sidecar_path(entry_path);
    let dir = sidecar.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    io::Write::write_all(&mut staged, &json)?;
    staged.persist(&sidecar).map_err(|e| e.error)?;
    Ok(())
}

/// Read metadata for an entry; `None` when absent or malformed
pub fn read(entry_path: &Path) -> Option<EntryMetadata> {
    let sidecar = sidecar_path(entry_path);
    let bytes = match fs::read(&sidecar) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = ?sidecar, error = %e, "Failed to read entry metadata");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!(path = ?sidecar, error = %e, "Failed to parse entry metadata");
            None
        }
    }
}
