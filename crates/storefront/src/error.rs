//! Unified error handling for the storefront client.
//!
//! `ClientError` covers transport-level faults only: the network failed, the
//! server answered with something that is not the JSON envelope, or durable
//! storage could not be read. Business refusals (`{success: false}`) are not
//! errors; they travel as [`crate::api::ApiResponse::Failure`] and
//! [`crate::stores::StoreResult`] values.

use thiserror::Error;

use crate::storage::StorageError;

/// Transport-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (network, DNS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status without a JSON body.
    #[error("Unexpected HTTP {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// First part of the response body, for diagnostics.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Durable storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A request URL could not be built from the configured base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::UnexpectedStatus {
            status: 502,
            body: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Unexpected HTTP 502: Bad Gateway");

        let err = ClientError::InvalidUrl("mailto:x".to_string());
        assert_eq!(err.to_string(), "Invalid URL: mailto:x");
    }
}
