//! Command implementations.
//!
//! Every command opens the same file-backed origin, so a session stored by
//! `login` is visible to later invocations.

pub mod account;
pub mod admin;
pub mod cart;
pub mod catalog;
pub mod forms;
pub mod reviews;
pub mod wishlist;

use opto_world_storefront::{
    ApiFailure, AuthError, ClientError, ConfigError, OriginStorage, StorageError, StoreResult,
    Storefront, StorefrontConfig,
};
use thiserror::Error;

/// Errors that end a command with a non-zero exit code.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The session file could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The API could not be reached or answered with garbage.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Sign-in or signup failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The server refused the request.
    #[error("{0}")]
    Refused(#[from] ApiFailure),

    /// A store operation was refused.
    #[error("{0}")]
    Store(String),

    /// A command-line value could not be used.
    #[error("Invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Open this invocation's tab on the configured storage file.
///
/// # Errors
///
/// Returns an error if the storage file is unreadable or the HTTP client
/// cannot be built.
pub fn open(config: &StorefrontConfig) -> Result<Storefront, CommandError> {
    let origin = OriginStorage::file(&config.storage_path)?;
    Ok(Storefront::new(config, &origin)?)
}

/// Turn a refused store result into an error, passing successes through.
fn accepted<T>(result: StoreResult<T>) -> Result<StoreResult<T>, CommandError> {
    if result.success {
        return Ok(result);
    }
    let message = result
        .message
        .unwrap_or_else(|| "Request failed".to_string());
    if result.login_required {
        return Err(CommandError::Store(format!(
            "{message} (run `ow-cli login` first)"
        )));
    }
    Err(CommandError::Store(message))
}
