//! Opto-World Storefront client library.
//!
//! Keeps a shopper's session, cart and wishlist in step with the Opto-World
//! REST API, and with every other tab of the same origin.
//!
//! # Modules
//!
//! - [`storage`] - Durable per-origin key/value storage with cross-tab notices
//! - [`events`] - Session event bus and the storage bridge
//! - [`session`] - Token and cached profile
//! - [`api`] - REST client for auth, catalog, cart, wishlist and forms
//! - [`stores`] - Cart and wishlist mirrors with ordered response handling
//! - [`services`] - Authentication flows
//! - [`state`] - Per-tab bundle of all of the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod services;
pub mod session;
pub mod state;
pub mod storage;
pub mod stores;

pub use api::{ApiClient, ApiFailure, ApiResponse};
pub use config::{ConfigError, StorefrontConfig};
pub use error::{ClientError, Result};
pub use events::{EventBus, SessionEvent};
pub use services::{AuthError, AuthService};
pub use session::{Session, SessionProfile};
pub use state::Storefront;
pub use storage::{LocalStorage, OriginStorage, StorageError};
pub use stores::{CartStore, LoginRedirect, StorePhase, StoreResult, WishlistStore};
