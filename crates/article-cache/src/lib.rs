//! # Article Cache
//!
//! A disk-backed content cache for offline article storage.
//!
//! ## Features
//!
//! - Write-once, content-addressed flat file store with no-clobber atomic writes
//! - MIME type (and ETag) metadata kept in a sidecar next to each entry
//! - Downloads tracked per article so they can be cancelled together
//! - Batch migration of previously cached content, tolerant of partial failure
//!
//! ## Example
//!
//! ```no_run
//! use article_cache::{CacheConfig, CacheFileWriter};
//!
//! # async fn run() -> Result<(), article_cache::CacheError> {
//! let config = CacheConfig::builder()
//!     .with_cache_root("/tmp/article-cache")
//!     .build();
//! let writer = CacheFileWriter::from_config(&config)?;
//!
//! let outcome = writer
//!     .add("Dog", "https://en.wikipedia.org/wiki/Dog")
//!     .await?;
//! println!("stored, etag = {:?}", outcome.etag);
//! # Ok(())
//! # }
//! ```

pub mod article;
pub mod assets;
pub mod builder;
pub mod cache_writer;
pub mod config;
pub mod error;
pub mod fetch;
pub mod image_key;
pub mod store;
pub mod tracker;

pub use builder::CacheConfigBuilder;
pub use cache_writer::{AddOutcome, CacheFileWriter};
pub use config::{CacheConfig, FetcherConfig};
pub use error::CacheError;

pub use assets::{AssetSource, AssetTable, BundledAssets};
pub use fetch::{FetchError, FetchedResource, HttpFetcher, ResourceFetcher, ResponseMetadata};
pub use store::{
    AtomicFileWriter, CacheEntry, EntryMetadata, EntryStore, KeyDeriver, WriteOutcome, WriteSource,
};
pub use tracker::{Cancel, TaskTracker, UntrackToken};
