//! Error types for talking to the metrics API.

use thiserror::Error;

/// Errors that can occur while fetching from the metrics API.
///
/// Every variant is scoped to the query that produced it; nothing here is
/// fatal to the application.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("HTTP {status} - {body}")]
    Status { status: u16, body: String },

    /// Connection, timeout or other transport failure.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// The configured base URL cannot be used to build endpoints.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_includes_code_and_body() {
        let err = ApiError::Status {
            status: 503,
            body: "warehouse unavailable".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("warehouse unavailable"));
    }
}
