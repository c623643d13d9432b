//! # Resource Fetching
//!
//! The boundary between the cache and the network. A fetcher downloads a URL
//! into a temporary file and reports the response metadata; everything the
//! cache needs to know about the transport is folded into [`FetchError`].

mod http;

use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tempfile::TempPath;
use url::Url;

pub use self::http::{HttpFetcher, create_client};

/// Metadata of a completed response
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    pub status: StatusCode,
    /// MIME type without parameters (`text/html`, not `text/html; charset=utf-8`)
    pub mime_type: Option<String>,
    pub etag: Option<String>,
    pub headers: HeaderMap,
}

impl ResponseMetadata {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            mime_type: None,
            etag: None,
            headers: HeaderMap::new(),
        }
    }

    /// Build metadata from response headers
    pub fn from_headers(status: StatusCode, headers: HeaderMap) -> Self {
        let etag = header_str(&headers, reqwest::header::ETAG);
        let mime_type = header_str(&headers, reqwest::header::CONTENT_TYPE).map(|v| mime_essence(&v));
        Self {
            status,
            mime_type,
            etag,
            headers,
        }
    }
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Strip parameters from a `Content-Type` value
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// A successful download
#[derive(Debug)]
pub struct FetchedResource {
    /// Downloaded body; removed from disk when dropped unless moved away first
    pub temp_file: Option<TempPath>,
    pub metadata: ResponseMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Server returned unexpected status code {0}")]
    UnexpectedStatus(StatusCode),

    #[error("Response metadata missing")]
    MissingResponse,

    #[error("Transport error: {0}")]
    Transport(Box<dyn StdError + Send + Sync>),

    #[error("I/O error while storing download: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(Box::new(err))
    }
}

/// Statuses a fetcher may report as success
pub fn is_acceptable_status(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::NOT_MODIFIED
}

/// Downloads resources for the cache.
///
/// Implementations must hand back a temp file the caller exclusively owns,
/// report statuses outside {200, 304} as [`FetchError::UnexpectedStatus`],
/// and keep transport failures distinct from HTTP-level ones. A fetch is
/// cancelled by dropping its future.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FetchedResource, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_mime_essence() {
        assert_eq!(mime_essence("text/html; charset=utf-8"), "text/html");
        assert_eq!(mime_essence(" Text/CSS "), "text/css");
        assert_eq!(mime_essence(""), "");
    }

    #[test]
    fn test_metadata_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ETAG, HeaderValue::from_static("\"abc123\""));
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );

        let metadata = ResponseMetadata::from_headers(StatusCode::OK, headers);
        assert_eq!(metadata.etag.as_deref(), Some("\"abc123\""));
        assert_eq!(metadata.mime_type.as_deref(), Some("text/html"));
    }

    #[test]
    fn test_acceptable_statuses() {
        assert!(is_acceptable_status(StatusCode::OK));
        assert!(is_acceptable_status(StatusCode::NOT_MODIFIED));
        assert!(!is_acceptable_status(StatusCode::NO_CONTENT));
        assert!(!is_acceptable_status(StatusCode::NOT_FOUND));
    }
}
