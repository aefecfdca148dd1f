//! Authentication error types.

use thiserror::Error;

use crate::api::ApiFailure;
use crate::error::ClientError;
use crate::storage::StorageError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] opto_world_core::EmailError),

    /// Password too short or empty.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Name missing on signup.
    #[error("name is required")]
    MissingName,

    /// The backend refused (wrong credentials, email taken, expired token).
    #[error("{0}")]
    Rejected(ApiFailure),

    /// The backend could not be reached.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The session could not be persisted.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

impl AuthError {
    /// Whether the backend rejected the credentials or token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Rejected(failure) if failure.is_unauthorized())
    }
}
