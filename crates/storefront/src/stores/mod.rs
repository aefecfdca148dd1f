//! Client-side mirrors of the server's cart and wishlist.
//!
//! Each store holds the last snapshot the server returned and replaces it
//! wholesale on every successful response; nothing is patched or
//! recomputed locally. Stores follow the session: they drop their snapshot
//! when the token disappears and refetch when one appears, whether the
//! change happened in this tab or another.
//!
//! # Phases
//!
//! ```text
//! Unauthenticated --(session established)--> Loading --(fetch done)--> Ready
//! Ready --(mutation)--> Loading --(done)--> Ready
//! Ready | Loading --(session cleared)--> Unauthenticated
//! ```
//!
//! # Ordering
//!
//! Every request is stamped with a per-store sequence number when it is
//! issued. A response is applied only if its number is higher than that of
//! the last applied response, and clearing the session discards everything
//! still in flight. Callers always get the server's answer back, even when
//! it arrived too late to be applied.

mod cart;
mod sync;
mod wishlist;

pub use cart::CartStore;
pub use wishlist::WishlistStore;

use std::sync::Arc;

use crate::api::ApiFailure;

/// Callback invoked when an operation needs the user to sign in first.
pub type LoginRedirect = Arc<dyn Fn() + Send + Sync>;

/// Where a store is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorePhase {
    /// No session; the snapshot is empty.
    Unauthenticated,
    /// A request is in flight or the first fetch has not finished.
    Loading,
    /// Idle with the last applied snapshot.
    Ready,
}

/// Outcome of a store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreResult<T> {
    pub success: bool,
    /// Message for the user, if any.
    pub message: Option<String>,
    /// The operation was refused because nobody is signed in.
    pub login_required: bool,
    /// HTTP status when the server refused.
    pub status: Option<u16>,
    /// The server's snapshot on success.
    pub data: Option<T>,
}

impl<T> StoreResult<T> {
    pub(crate) fn ok(data: T, message: Option<String>) -> Self {
        Self {
            success: true,
            message,
            login_required: false,
            status: None,
            data: Some(data),
        }
    }

    pub(crate) fn refused(failure: ApiFailure) -> Self {
        Self {
            success: false,
            message: Some(failure.message),
            login_required: false,
            status: Some(failure.status),
            data: None,
        }
    }

    /// Refused locally without contacting the server.
    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            login_required: false,
            status: None,
            data: None,
        }
    }

    pub(crate) fn login_required(message: impl Into<String>) -> Self {
        Self {
            login_required: true,
            ..Self::rejected(message)
        }
    }
}
