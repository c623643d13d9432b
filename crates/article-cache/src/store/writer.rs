//! # Atomic File Writer
//!
//! Places content into the flat cache root with a single no-clobber
//! filesystem operation. An existing entry is never overwritten: the second
//! writer for a key observes [`WriteOutcome::AlreadyExists`].

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::key::KeyDeriver;
use super::metadata::{self, EntryMetadata};
use super::{CacheEntry, EntryStore, WriteOutcome, WriteSource};

const STAGING_PREFIX: &str = ".staging-";

#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    root: PathBuf,
    deriver: KeyDeriver,
}

impl AtomicFileWriter {
    /// Create a writer over `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>, deriver: KeyDeriver) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, deriver })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn deriver(&self) -> KeyDeriver {
        self.deriver
    }

    /// Destination path for a cache key
    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(self.deriver.derive_file_name(key))
    }

    /// Destination path, refusing raw keys that would land on a sidecar file
    fn checked_entry_path(&self, key: &str) -> io::Result<PathBuf> {
        if !self.deriver.is_hashing() && key.ends_with(metadata::SIDECAR_SUFFIX) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("raw cache key {key:?} collides with a metadata sidecar name"),
            ));
        }
        Ok(self.entry_path(key))
    }

    /// Move a downloaded file into the store.
    ///
    /// A hard link gives an atomic no-clobber placement; the source is removed
    /// once linked. When linking is impossible (different filesystem, no link
    /// support) the bytes are staged inside the root instead.
    fn move_file(&self, source: &Path, dest: &Path) -> io::Result<WriteOutcome> {
        match fs::hard_link(source, dest) {
            Ok(()) => {
                if let Err(e) = fs::remove_file(source) {
                    debug!(path = ?source, error = %e, "Failed to remove moved source file");
                }
                Ok(WriteOutcome::Created)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(WriteOutcome::AlreadyExists),
            Err(e) => {
                debug!(from = ?source, to = ?dest, error = %e, "Hard link failed, staging a copy");
                let outcome = self.copy_file(source, dest)?;
                if outcome == WriteOutcome::Created {
                    let _ = fs::remove_file(source);
                }
                Ok(outcome)
            }
        }
    }

    fn copy_file(&self, source: &Path, dest: &Path) -> io::Result<WriteOutcome> {
        let mut input = File::open(source)?;
        self.place_staged(dest, |file| io::copy(&mut input, file).map(|_| ()))
    }

    /// Stage bytes in a temp file inside the root, then persist without clobbering
    fn place_staged<F>(&self, dest: &Path, fill: F) -> io::Result<WriteOutcome>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let mut staged = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempfile_in(&self.root)?;
        fill(staged.as_file_mut())?;
        staged.as_file_mut().flush()?;
        staged.as_file().sync_data()?;

        match staged.persist_noclobber(dest) {
            Ok(_) => Ok(WriteOutcome::Created),
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Ok(WriteOutcome::AlreadyExists)
            }
            Err(e) => Err(e.error),
        }
    }
}

impl EntryStore for AtomicFileWriter {
    fn write(
        &self,
        source: WriteSource<'_>,
        key: &str,
        metadata: Option<EntryMetadata>,
    ) -> io::Result<WriteOutcome> {
        let dest = self.checked_entry_path(key).inspect_err(|e| {
            warn!(key, error = %e, "Rejected cache key");
        })?;

        let result = match source {
            WriteSource::TempFile(path) => self.move_file(path, &dest),
            WriteSource::Copy(path) => self.copy_file(path, &dest),
            WriteSource::Content(bytes) => self.place_staged(&dest, |file| file.write_all(bytes)),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(key, path = ?dest, error = %e, "Failed to write cache entry");
                return Err(e);
            }
        };

        if outcome == WriteOutcome::Created {
            if let Some(metadata) = metadata {
                if let Err(e) = metadata::attach(&dest, &metadata) {
                    warn!(key, path = ?dest, error = %e, "Failed to attach entry metadata");
                }
            }
            debug!(key, path = ?dest, "Created cache entry");
        } else {
            debug!(key, path = ?dest, "Cache entry already exists");
        }

        Ok(outcome)
    }

    fn lookup(&self, key: &str) -> Option<CacheEntry> {
        let path = self.checked_entry_path(key).ok()?;
        if !path.is_file() {
            return None;
        }
        let metadata = metadata::read(&path);
        Some(CacheEntry {
            mime_type: metadata.as_ref().and_then(|m| m.mime_type.clone()),
            etag: metadata.and_then(|m| m.etag),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(dir: &Path) -> AtomicFileWriter {
        AtomicFileWriter::new(dir.join("store"), KeyDeriver::default()).unwrap()
    }

    fn staging_files(root: &Path) -> usize {
        fs::read_dir(root)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(STAGING_PREFIX))
            .count()
    }

    #[test]
    fn test_new_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let w = writer(dir.path());
        assert!(w.root().is_dir());
    }

    #[test]
    fn test_content_write_then_exists_keeps_first_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let w = writer(dir.path());
        let key = "https://en.wikipedia.org/wiki/Dog";

        let first = w
            .write(WriteSource::Content(b"first"), key, Some(EntryMetadata::new("text/html")))
            .unwrap();
        assert_eq!(first, WriteOutcome::Created);

        let second = w
            .write(WriteSource::Content(b"second"), key, Some(EntryMetadata::new("text/plain")))
            .unwrap();
        assert_eq!(second, WriteOutcome::AlreadyExists);

        let entry = w.lookup(key).unwrap();
        assert_eq!(fs::read(&entry.path).unwrap(), b"first");
        assert_eq!(entry.mime_type.as_deref(), Some("text/html"));
        assert_eq!(staging_files(w.root()), 0);
    }

    #[test]
    fn test_temp_file_is_moved() {
        let dir = tempfile::tempdir().unwrap();
        let w = writer(dir.path());
        let source = dir.path().join("download.tmp");
        fs::write(&source, "<html></html>").unwrap();

        let outcome = w
            .write(WriteSource::TempFile(&source), "https://site/Article", None)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Created);
        assert!(!source.exists());

        let entry = w.lookup("https://site/Article").unwrap();
        assert_eq!(fs::read_to_string(&entry.path).unwrap(), "<html></html>");
        assert!(entry.mime_type.is_none());
    }

    #[test]
    fn test_temp_file_onto_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let w = writer(dir.path());
        w.write(WriteSource::Content(b"original"), "k", None).unwrap();

        let source = dir.path().join("download.tmp");
        fs::write(&source, "replacement").unwrap();
        let outcome = w.write(WriteSource::TempFile(&source), "k", None).unwrap();

        assert_eq!(outcome, WriteOutcome::AlreadyExists);
        assert_eq!(fs::read(w.entry_path("k")).unwrap(), b"original");
    }

    #[test]
    fn test_copy_leaves_source_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let w = writer(dir.path());
        let asset = dir.path().join("baseCSS.css");
        fs::write(&asset, "body {}").unwrap();

        let outcome = w
            .write(WriteSource::Copy(&asset), "css", Some(EntryMetadata::new("text/css")))
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Created);
        assert!(asset.exists());
        assert_eq!(fs::read_to_string(w.entry_path("css")).unwrap(), "body {}");
    }

    #[test]
    fn test_missing_copy_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let w = writer(dir.path());
        let err = w
            .write(WriteSource::Copy(&dir.path().join("absent.css")), "css", None)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(w.lookup("css").is_none());
    }

    #[test]
    fn test_raw_key_with_separator_fails() {
        let dir = tempfile::tempdir().unwrap();
        let w = AtomicFileWriter::new(dir.path().join("store"), KeyDeriver::raw()).unwrap();
        let result = w.write(WriteSource::Content(b"x"), "no-such-dir/key", None);
        assert!(result.is_err());
        assert_eq!(staging_files(w.root()), 0);
    }

    #[test]
    fn test_raw_key_cannot_shadow_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let w = AtomicFileWriter::new(dir.path().join("store"), KeyDeriver::raw()).unwrap();
        w.write(WriteSource::Content(b"<html></html>"), "page", Some(EntryMetadata::new("text/html")))
            .unwrap();

        let err = w
            .write(WriteSource::Content(b"other"), "page.meta", None)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(w.lookup("page.meta").is_none());

        let entry = w.lookup("page").unwrap();
        assert_eq!(entry.mime_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn test_hashed_key_with_sidecar_suffix_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let w = writer(dir.path());
        let outcome = w
            .write(WriteSource::Content(b"x"), "https://site/file.meta", None)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Created);
        assert!(w.lookup("https://site/file.meta").is_some());
    }

    #[test]
    fn test_concurrent_writers_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let w = std::sync::Arc::new(writer(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let w = w.clone();
                std::thread::spawn(move || {
                    let body = format!("writer-{i}");
                    w.write(WriteSource::Content(body.as_bytes()), "shared", None)
                        .unwrap()
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let created = outcomes
            .iter()
            .filter(|o| **o == WriteOutcome::Created)
            .count();
        assert_eq!(created, 1);
        assert!(fs::read_to_string(w.entry_path("shared"))
            .unwrap()
            .starts_with("writer-"));
    }
}
