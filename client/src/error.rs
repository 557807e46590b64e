//! Error types for the seat-inventory client

use thiserror::Error;

/// Errors that can occur when talking to the seat-inventory service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// The configured base URL could not be used to build a client
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// HTTP request failed (connection refused, timeout, reset)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Unauthorized - no session, or wrong credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Service answered with an `{error}` payload or a non-success status
    #[error("Service rejected request (status {status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },
}

impl InventoryError {
    /// Whether the failure happened below the application protocol
    /// (transport or malformed response).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_) | Self::ResponseParseFailed(_) | Self::InvalidBaseUrl(_)
        )
    }
}
