//! Integration tests for the Opto-World storefront client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p opto-world-integration-tests
//! ```
//!
//! No backend is needed: every test starts a [`wiremock`] server that plays
//! the REST API, and opens several "tabs" on one shared origin storage.
//!
//! # Test Categories
//!
//! - `cross_tab` - Sign-in and sign-out propagation between tabs
//! - `ordering` - Late and out-of-order responses
//! - `persistence` - File-backed sessions surviving a restart

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::time::Duration;

use opto_world_storefront::{OriginStorage, SessionProfile, Storefront, StorefrontConfig};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::MockServer;

/// How long [`eventually`] waits before giving up.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(3);

/// A mock backend plus the storage shared by every tab of one origin.
pub struct TestOrigin {
    pub server: MockServer,
    pub origin: OriginStorage,
}

impl TestOrigin {
    /// Start a mock backend with in-memory origin storage.
    pub async fn start() -> Self {
        Self::with_storage(OriginStorage::memory()).await
    }

    /// Start a mock backend over the given origin storage.
    pub async fn with_storage(origin: OriginStorage) -> Self {
        Self {
            server: MockServer::start().await,
            origin,
        }
    }

    /// Configuration pointing at the mock backend.
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::with_api_url(&format!("{}/api", self.server.uri())).unwrap()
    }

    /// Open and start a new tab.
    pub fn open_tab(&self) -> Storefront {
        let tab = Storefront::new(&self.config(), &self.origin).unwrap();
        tab.start();
        tab
    }
}

/// Store a session in `tab` without going through the auth endpoints.
pub fn sign_in(tab: &Storefront, token: &str) {
    tab.session()
        .set_session(
            &SecretString::from(token.to_string()),
            &SessionProfile::default(),
        )
        .unwrap();
}

/// Poll `condition` until it holds or the timeout passes.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// A cart envelope with `(id, name, quantity, unit_price, stock)` lines.
pub fn cart_body(lines: &[(&str, &str, u32, i64, Option<u32>)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, name, quantity, price, stock)| {
            json!({
                "product": {"_id": id, "name": name, "brand": "Opto", "stock": stock},
                "quantity": quantity,
                "price": price,
            })
        })
        .collect();
    let total_items: u32 = lines.iter().map(|line| line.2).sum();
    let total_price: i64 = lines
        .iter()
        .map(|line| i64::from(line.2) * line.3)
        .sum();

    json!({
        "success": true,
        "cart": {"items": items, "totalItems": total_items, "totalPrice": total_price}
    })
}
