//! Error types for the booking engine.

use showtime_client::InventoryError;
use showtime_runtime::StoreError;
use thiserror::Error;

/// Errors surfaced by catalog, snapshot and reservation operations.
///
/// `Clone` so a failure can travel inside a [`SessionAction`](crate::session::SessionAction).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BookingError {
    /// Transport failure or malformed response
    #[error("Network error: {0}")]
    Network(String),

    /// The login/register/login chain did not produce a session
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rejected before any network call (empty selection, busy workflow, no show)
    #[error("{0}")]
    Validation(String),

    /// The service answered a batch call with an `{error}` payload
    #[error("{0}")]
    Service(String),

    /// Unknown show or booking
    #[error("Not found: {0}")]
    NotFound(String),

    /// `book_held` found no live hold in the fresh snapshot
    #[error("You must hold seats before booking")]
    NothingToBook,

    /// The session store stopped or did not answer in time
    #[error("Session error: {0}")]
    Session(#[from] StoreError),
}

impl BookingError {
    /// Map a failure from a batch call (hold, book, release).
    ///
    /// The service reports every per-seat problem as an `{error}` payload, so
    /// anything that is not transport or auth is a service rejection here.
    #[must_use]
    pub fn from_batch(error: InventoryError) -> Self {
        match error {
            InventoryError::NotFound(message) | InventoryError::Rejected { message, .. } => {
                Self::Service(message)
            },
            other => Self::from(other),
        }
    }
}

impl From<InventoryError> for BookingError {
    fn from(error: InventoryError) -> Self {
        match error {
            InventoryError::RequestFailed(message)
            | InventoryError::ResponseParseFailed(message)
            | InventoryError::InvalidBaseUrl(message) => Self::Network(message),
            InventoryError::Unauthorized => Self::Auth("session is not authenticated".to_string()),
            InventoryError::NotFound(message) => Self::NotFound(message),
            InventoryError::Rejected { message, .. } => Self::Service(message),
        }
    }
}
