use thiserror::Error;

use super::lifecycle::WorkerState;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Bad response status {status} for {url}")]
    BadStatus { url: String, status: u16 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Cache storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Cannot {operation} while worker is {state}")]
    InvalidState {
        operation: &'static str,
        state: WorkerState,
    },
}

/// Maximum length for URLs embedded in error messages
const MAX_ERROR_URL_LENGTH: usize = 200;

impl WorkerError {
    /// Truncate a URL to avoid logging excessive data
    fn truncate_url(url: &str) -> String {
        crate::utils::truncate_string(url, MAX_ERROR_URL_LENGTH)
    }

    /// Map a non-success HTTP status to an error.
    /// `Cache.add` rejects any response outside the 2xx range, so this is
    /// used for both install-time adds and local directory lookups.
    pub fn from_status(url: &str, status: u16) -> Self {
        let url = Self::truncate_url(url);
        match status {
            404 => WorkerError::NotFound(url),
            _ => WorkerError::BadStatus { url, status },
        }
    }
}
