//! Services that coordinate the API client with session state.
//!
//! # Services
//!
//! - `auth` - Login, signup, logout and profile refresh

pub mod auth;

pub use auth::{AuthError, AuthService};
