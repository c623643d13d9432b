//! # Builder for CacheConfig
//!
//! Fluent construction of [`CacheConfig`] instances.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use article_cache::CacheConfig;
//!
//! let config = CacheConfig::builder()
//!     .with_cache_root("/tmp/article-cache")
//!     .with_assets_dir("/opt/app/assets/pcs-html-converter")
//!     .with_timeout(Duration::from_secs(60))
//!     .with_user_agent("MyReader/1.0")
//!     .with_header("X-Client", "offline-sync")
//!     .build();
//!
//! assert!(config.hash_file_names);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::HeaderValue;

use crate::{CacheConfig, FetcherConfig};

/// Builder for creating CacheConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct CacheConfigBuilder {
    config: CacheConfig,
}

impl CacheConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CacheConfig::default(),
        }
    }

    /// Set the cache root directory
    pub fn with_cache_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_root = path.into();
        self
    }

    /// Set the directory downloads are staged into
    pub fn with_temp_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(path.into());
        self
    }

    /// Set the bundled assets directory
    pub fn with_assets_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.assets_dir = path.into();
        self
    }

    /// Enable or disable hashing of cache keys into file names
    pub fn with_hashed_file_names(mut self, enabled: bool) -> Self {
        self.config.hash_file_names = enabled;
        self
    }

    /// Replace the whole fetcher configuration
    pub fn with_fetcher_config(mut self, fetcher: FetcherConfig) -> Self {
        self.config.fetcher = fetcher;
        self
    }

    /// Set the overall timeout for the entire HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetcher.timeout = timeout;
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetcher.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.fetcher.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.fetcher.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<reqwest::header::HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.fetcher.headers.insert(name, value);
        }
        self
    }

    /// Merge a set of headers, overriding defaults with the same name
    pub fn with_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.config.fetcher.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Set whether to use system proxy settings
    pub fn with_system_proxy(mut self, use_system_proxy: bool) -> Self {
        self.config.fetcher.use_system_proxy = use_system_proxy;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> CacheConfig {
        self.config
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = CacheConfigBuilder::new().build();
        assert!(config.hash_file_names);
        assert!(config.temp_dir.is_none());
        assert_eq!(config.fetcher.timeout, Duration::from_secs(30));
        assert_eq!(config.fetcher.connect_timeout, Duration::from_secs(10));
        assert!(config.fetcher.follow_redirects);
        assert!(config.fetcher.use_system_proxy);
        assert_eq!(config.download_dir(), config.cache_root);
    }

    #[test]
    fn test_builder_customization() {
        let config = CacheConfigBuilder::new()
            .with_cache_root("/var/cache/articles")
            .with_temp_dir("/var/tmp/articles")
            .with_hashed_file_names(false)
            .with_timeout(Duration::from_secs(60))
            .with_follow_redirects(false)
            .with_user_agent("CustomUserAgent/1.0")
            .with_header("X-Custom-Header", "CustomValue")
            .with_system_proxy(false)
            .build();

        assert_eq!(config.cache_root, PathBuf::from("/var/cache/articles"));
        assert_eq!(config.download_dir(), PathBuf::from("/var/tmp/articles"));
        assert!(!config.hash_file_names);
        assert_eq!(config.fetcher.timeout, Duration::from_secs(60));
        assert!(!config.fetcher.follow_redirects);
        assert_eq!(config.fetcher.user_agent, "CustomUserAgent/1.0");
        assert!(!config.fetcher.use_system_proxy);

        let header_value = config.fetcher.headers.get("X-Custom-Header").unwrap();
        assert_eq!(header_value.to_str().unwrap(), "CustomValue");
    }

    #[test]
    fn test_invalid_header_is_ignored() {
        let config = CacheConfigBuilder::new()
            .with_header("Bad Header", "value")
            .build();
        assert!(config.fetcher.headers.get("Bad Header").is_none());
    }
}
