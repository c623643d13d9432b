use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

const DEFAULT_USER_AGENT: &str = concat!("article-cache/", env!("CARGO_PKG_VERSION"));

/// Options for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Overall timeout for the entire HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Custom HTTP headers for requests
    pub headers: HeaderMap,

    /// Whether to use system proxy settings if available
    pub use_system_proxy: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            headers: FetcherConfig::get_default_headers(),
            use_system_proxy: true,
        }
    }
}

impl FetcherConfig {
    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(
            reqwest::header::ACCEPT_ENCODING,
            HeaderValue::from_static("gzip, deflate"),
        );

        default_headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("text/html,text/css,application/javascript,image/*;q=0.9,*/*;q=0.8"),
        );

        default_headers
    }
}

/// Configuration for the article cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Flat directory holding cached entries
    pub cache_root: PathBuf,

    /// Directory where downloads are staged before being moved into the store.
    /// When `None`, the cache root is used so that moves stay on one filesystem.
    pub temp_dir: Option<PathBuf>,

    /// Hash cache keys into file names; when disabled keys are used verbatim
    pub hash_file_names: bool,

    /// Directory holding the bundled offline resources
    pub assets_dir: PathBuf,

    /// HTTP fetcher options
    pub fetcher: FetcherConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_root: std::env::temp_dir().join("article-cache"),
            temp_dir: None,
            hash_file_names: true,
            assets_dir: PathBuf::from("assets").join("pcs-html-converter"),
            fetcher: FetcherConfig::default(),
        }
    }
}

impl CacheConfig {
    pub fn builder() -> crate::builder::CacheConfigBuilder {
        crate::builder::CacheConfigBuilder::new()
    }

    /// Directory downloads are staged into
    pub fn download_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| self.cache_root.clone())
    }
}
