//! Opto-World Core - Shared types library.
//!
//! This crate provides common types used across all Opto-World components:
//! - `storefront` - Storefront client library (session, cart, wishlist, REST client)
//! - `cli` - Command-line front end for the storefront client
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, roles, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
