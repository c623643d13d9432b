//! # Cache File Writer
//!
//! Orchestrates downloads into the content store. `add` fetches a single
//! resource and stores it under its item key; `migrate` backfills the store
//! from content that was cached before the store existed.

use std::io;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::article::{mobile_html_url, site_url};
use crate::assets::{AssetTable, BundledAssets};
use crate::error::CacheError;
use crate::fetch::{FetchedResource, HttpFetcher, ResourceFetcher};
use crate::store::{
    AtomicFileWriter, CacheEntry, EntryMetadata, EntryStore, KeyDeriver, WriteOutcome,
    WriteSource,
};
use crate::tracker::{TaskTracker, UntrackToken};
use crate::CacheConfig;

/// Result of a successful `add`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// ETag of the downloaded resource, if the server sent one
    pub etag: Option<String>,
    /// Whether this call created the entry or found it already present
    pub write: WriteOutcome,
}

/// Untracks its task when dropped, whichever way `add` finishes
struct TrackedTask<'a> {
    tracker: &'a TaskTracker<CancellationToken>,
    group_key: &'a str,
    token: UntrackToken,
}

impl Drop for TrackedTask<'_> {
    fn drop(&mut self) {
        self.tracker.untrack(self.group_key, self.token);
    }
}

pub struct CacheFileWriter {
    fetcher: Arc<dyn ResourceFetcher>,
    store: Arc<dyn EntryStore>,
    assets: BundledAssets,
    tracker: TaskTracker<CancellationToken>,
}

impl CacheFileWriter {
    pub fn new(
        fetcher: Arc<dyn ResourceFetcher>,
        store: Arc<dyn EntryStore>,
        assets: BundledAssets,
    ) -> Self {
        Self {
            fetcher,
            store,
            assets,
            tracker: TaskTracker::new(),
        }
    }

    /// Build a writer with an HTTP fetcher and an on-disk store.
    /// Creates the cache root if it does not exist.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let store = AtomicFileWriter::new(
            &config.cache_root,
            KeyDeriver::new(config.hash_file_names),
        )?;
        let fetcher = HttpFetcher::from_config(config)?;

        info!(cache_root = ?config.cache_root, "Article cache ready");

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(store),
            BundledAssets::new(&config.assets_dir),
        ))
    }

    pub fn tracker(&self) -> &TaskTracker<CancellationToken> {
        &self.tracker
    }

    /// Download `item_key` and store it under that key.
    ///
    /// The task is tracked under `group_key` until this returns, so
    /// [`cancel`](Self::cancel) can abort it. An entry that already exists is
    /// reported as success.
    pub async fn add(&self, group_key: &str, item_key: &str) -> Result<AddOutcome, CacheError> {
        let item_url =
            Url::parse(item_key).map_err(|_| CacheError::InvalidItemKey(item_key.to_string()))?;
        let download_url = mobile_html_url(&item_url).unwrap_or(item_url);

        let cancel = CancellationToken::new();
        let _tracked = TrackedTask {
            tracker: &self.tracker,
            group_key,
            token: self.tracker.track(group_key, cancel.clone()),
        };

        debug!(group = group_key, key = item_key, url = %download_url, "Fetching resource");

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(group = group_key, key = item_key, "Fetch cancelled");
                return Err(CacheError::Cancelled);
            }
            result = self.fetcher.fetch(&download_url) => result,
        };

        let FetchedResource {
            temp_file,
            metadata,
        } = fetched.inspect_err(|e| {
            debug!(group = group_key, key = item_key, error = %e, "Fetch failed");
        })?;

        let temp_file = temp_file.ok_or(CacheError::MissingTemporaryFile)?;
        let etag = metadata.etag;
        let entry_metadata = EntryMetadata::from_response(metadata.mime_type, etag.clone());

        let store = Arc::clone(&self.store);
        let key = item_key.to_string();
        let write = tokio::task::spawn_blocking(move || {
            // temp_file is dropped at the end of this closure, removing it if the
            // store did not move it
            store.write(WriteSource::TempFile(&temp_file), &key, entry_metadata)
        })
        .await
        .map_err(io::Error::other)??;

        debug!(group = group_key, key = item_key, outcome = ?write, "Stored resource");

        Ok(AddOutcome { etag, write })
    }

    /// Run [`add`](Self::add) on the runtime and hand the result to `completion`
    pub fn spawn_add<C>(
        self: &Arc<Self>,
        group_key: impl Into<String>,
        item_key: impl Into<String>,
        completion: C,
    ) -> JoinHandle<()>
    where
        C: FnOnce(Result<AddOutcome, CacheError>) + Send + 'static,
    {
        let writer = Arc::clone(self);
        let group_key = group_key.into();
        let item_key = item_key.into();
        tokio::spawn(async move {
            let result = writer.add(&group_key, &item_key).await;
            completion(result);
        })
    }

    /// Cancel every in-flight `add` tracked under `group_key`.
    /// Entries already written stay in place.
    pub fn cancel(&self, group_key: &str) -> usize {
        self.tracker.cancel_all(group_key)
    }

    /// Backfill the store with content cached before the store existed.
    ///
    /// Keys naming a bundled resource of the article's site are copied from
    /// the bundled file; every other key receives `content`. Each key is
    /// attempted independently. Returns the keys that were stored (or were
    /// already present), failing only when none were.
    pub async fn migrate(
        &self,
        desktop_url: &Url,
        content: impl Into<String>,
        item_keys: Vec<String>,
        mime_type: impl Into<String>,
    ) -> Result<Vec<String>, CacheError> {
        let site = site_url(desktop_url)
            .ok_or_else(|| CacheError::UnableToDetermineSite(desktop_url.to_string()))?;
        let table = self.assets.resolve(&site);

        let store = Arc::clone(&self.store);
        let content = content.into();
        let mime_type = mime_type.into();
        let attempted = item_keys.len();

        let report = tokio::task::spawn_blocking(move || {
            migrate_batch(store.as_ref(), &table, content.as_bytes(), item_keys, &mime_type)
        })
        .await
        .map_err(io::Error::other)?;

        info!(
            site = %site,
            attempted,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Migrated cached content"
        );

        if report.succeeded.is_empty() {
            return Err(CacheError::AllMigrationsFailed { attempted });
        }
        Ok(report.succeeded)
    }

    /// Callback form of [`migrate`](Self::migrate)
    pub fn migrate_cached_content<S, F>(
        self: &Arc<Self>,
        desktop_url: Url,
        content: String,
        item_keys: Vec<String>,
        mime_type: String,
        on_success: S,
        on_failure: F,
    ) -> JoinHandle<()>
    where
        S: FnOnce(Vec<String>) + Send + 'static,
        F: FnOnce(CacheError) + Send + 'static,
    {
        let writer = Arc::clone(self);
        tokio::spawn(async move {
            match writer
                .migrate(&desktop_url, content, item_keys, mime_type)
                .await
            {
                Ok(succeeded) => on_success(succeeded),
                Err(e) => on_failure(e),
            }
        })
    }

    /// The stored entry for `key`, if any
    pub fn lookup(&self, key: &str) -> Option<CacheEntry> {
        self.store.lookup(key)
    }
}

struct MigrationReport {
    succeeded: Vec<String>,
    failed: Vec<(String, io::Error)>,
}

fn migrate_batch(
    store: &dyn EntryStore,
    table: &AssetTable,
    content: &[u8],
    item_keys: Vec<String>,
    mime_type: &str,
) -> MigrationReport {
    let mut report = MigrationReport {
        succeeded: Vec::with_capacity(item_keys.len()),
        failed: Vec::new(),
    };

    for key in item_keys {
        let result = match table.get(&key) {
            Some(asset) => store.write(
                WriteSource::Copy(&asset.path),
                &key,
                Some(EntryMetadata::new(asset.mime_type.clone())),
            ),
            None => store.write(
                WriteSource::Content(content),
                &key,
                Some(EntryMetadata::new(mime_type)),
            ),
        };

        match result {
            Ok(WriteOutcome::Created | WriteOutcome::AlreadyExists) => report.succeeded.push(key),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to migrate cache item");
                report.failed.push((key, e));
            }
        }
    }

    report
}
