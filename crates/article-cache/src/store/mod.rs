//! # Content Store
//!
//! The flat, write-once file store backing the article cache.

mod key;
pub mod metadata;
mod writer;

use std::io;
use std::path::{Path, PathBuf};

pub use key::KeyDeriver;
pub use metadata::EntryMetadata;
pub use writer::AtomicFileWriter;

/// Where the bytes of a new entry come from
#[derive(Debug, Clone, Copy)]
pub enum WriteSource<'a> {
    /// A downloaded file owned by the caller; moved into the store
    TempFile(&'a Path),
    /// An existing file that stays in place (bundled assets)
    Copy(&'a Path),
    /// In-memory content
    Content(&'a [u8]),
}

/// Result of a successful write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The entry was created by this write
    Created,
    /// An entry for the key was already present and was left untouched
    AlreadyExists,
}

/// A cached entry found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub mime_type: Option<String>,
    pub etag: Option<String>,
}

/// A write-once store keyed by cache key.
///
/// Operations are blocking; async callers run them on a blocking worker.
pub trait EntryStore: Send + Sync + 'static {
    /// Write `source` under `key`, attaching `metadata` when the entry is created
    fn write(
        &self,
        source: WriteSource<'_>,
        key: &str,
        metadata: Option<EntryMetadata>,
    ) -> io::Result<WriteOutcome>;

    /// Look up the entry stored under `key`
    fn lookup(&self, key: &str) -> Option<CacheEntry>;
}
