use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Network unreachable: {0}")]
    Offline(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker stopped before answering")]
    WorkerGone,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: u16, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status {
            404 => FetchError::NotFound(truncated),
            500..=599 => FetchError::ServerError(truncated),
            _ => FetchError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to fetch worker script {url}: {source}")]
    Script {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to precache {url}: {reason}")]
    Install { url: String, reason: String },

    #[error("Worker cannot {action} while {state}")]
    InvalidState { action: &'static str, state: String },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_classes() {
        assert!(matches!(FetchError::from_status(404, "gone"), FetchError::NotFound(_)));
        assert!(matches!(FetchError::from_status(500, ""), FetchError::ServerError(_)));
        assert!(matches!(FetchError::from_status(503, ""), FetchError::ServerError(_)));
        assert!(matches!(FetchError::from_status(418, ""), FetchError::InvalidResponse(_)));
    }

    #[test]
    fn test_from_status_truncates_long_bodies() {
        let body = "x".repeat(2000);
        match FetchError::from_status(500, &body) {
            FetchError::ServerError(msg) => {
                assert!(msg.len() < 600);
                assert!(msg.contains("2000 total bytes"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
