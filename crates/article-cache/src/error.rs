use reqwest::StatusCode;
use std::error::Error as StdError;

use crate::fetch::FetchError;

// Error type for cache write operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Item key is not a valid URL: {0}")]
    InvalidItemKey(String),

    #[error("Unexpected response (status: {status:?})")]
    UnexpectedResponse { status: Option<StatusCode> },

    #[error("Transport error: {0}")]
    Transport(Box<dyn StdError + Send + Sync>),

    #[error("Fetch reported success but no temporary file was produced")]
    MissingTemporaryFile,

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Unable to determine site from URL: {0}")]
    UnableToDetermineSite(String),

    #[error("All {attempted} migrated items failed to save")]
    AllMigrationsFailed { attempted: usize },

    #[error("Caching was cancelled")]
    Cancelled,

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<FetchError> for CacheError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::UnexpectedStatus(status) => CacheError::UnexpectedResponse {
                status: Some(status),
            },
            FetchError::MissingResponse => CacheError::UnexpectedResponse { status: None },
            FetchError::Transport(cause) => CacheError::Transport(cause),
            FetchError::Io(e) => CacheError::Filesystem(e),
        }
    }
}
