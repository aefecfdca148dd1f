//! Wishlist store.

use std::sync::Arc;

use opto_world_core::ProductId;
use tokio::task::JoinHandle;
use tracing::instrument;

use super::sync::{RequestKind, Snapshot, StoreCore};
use super::{LoginRedirect, StorePhase, StoreResult};
use crate::api::{ApiClient, ApiResponse, WishlistSnapshot};
use crate::error::Result;
use crate::events::SessionEvent;

const LOGIN_TO_USE: &str = "Please login to use your wishlist";

impl Snapshot for WishlistSnapshot {
    const NAME: &'static str = "wishlist";
    const LOGIN_MESSAGE: &'static str = LOGIN_TO_USE;

    fn fetch(api: &ApiClient) -> impl Future<Output = Result<ApiResponse<Self>>> + Send {
        api.get_wishlist()
    }
}

/// Client-side mirror of the signed-in user's wishlist.
#[derive(Clone)]
pub struct WishlistStore {
    inner: Arc<StoreCore<WishlistSnapshot>>,
}

impl std::fmt::Debug for WishlistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WishlistStore")
            .field("phase", &self.inner.sync.phase())
            .field(
                "count",
                &self.inner.sync.snapshot().map_or(0, |wishlist| wishlist.len()),
            )
            .finish_non_exhaustive()
    }
}

impl WishlistStore {
    /// Create a store that authenticates through `api`'s session.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(StoreCore::new(api)),
        }
    }

    /// Install a callback run when an add or remove is attempted without a
    /// session.
    pub fn set_login_redirect(&self, hook: Option<LoginRedirect>) {
        self.inner.set_login_redirect(hook);
    }

    /// Fetch now if signed in, then follow session events in the background.
    pub fn attach(&self) -> JoinHandle<()> {
        self.inner.attach()
    }

    /// React to a session event as the background listener would.
    pub async fn handle_event(&self, event: SessionEvent) {
        self.inner.handle_event(event).await;
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<StoreResult<Arc<WishlistSnapshot>>> {
        if !self.inner.ensure_session() {
            return Ok(self.inner.login_required(LOGIN_TO_USE, true));
        }
        let mut result = self
            .inner
            .run(
                RequestKind::Mutation,
                self.inner.api.add_to_wishlist(product_id),
            )
            .await?;
        if result.success {
            result.message = Some("Added to wishlist".to_string());
        }
        Ok(result)
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(
        &self,
        product_id: &ProductId,
    ) -> Result<StoreResult<Arc<WishlistSnapshot>>> {
        if !self.inner.ensure_session() {
            return Ok(self.inner.login_required(LOGIN_TO_USE, true));
        }
        let mut result = self
            .inner
            .run(
                RequestKind::Mutation,
                self.inner.api.remove_from_wishlist(product_id),
            )
            .await?;
        if result.success {
            result.message = Some("Removed from wishlist".to_string());
        }
        Ok(result)
    }

    /// Remove every product.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<StoreResult<Arc<WishlistSnapshot>>> {
        if !self.inner.ensure_session() {
            return Ok(self.inner.login_required(LOGIN_TO_USE, false));
        }
        let mut result = self
            .inner
            .run(RequestKind::Mutation, self.inner.api.clear_wishlist())
            .await?;
        if result.success {
            result.message = Some("Wishlist cleared".to_string());
        }
        Ok(result)
    }

    /// Reload the wishlist from the server.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<StoreResult<Arc<WishlistSnapshot>>> {
        self.inner.refresh().await
    }

    /// Whether the last snapshot lists `product_id`. May be stale.
    #[must_use]
    pub fn is_member(&self, product_id: &ProductId) -> bool {
        self.snapshot()
            .is_some_and(|wishlist| wishlist.contains(product_id))
    }

    /// Number of products, or 0 without a snapshot.
    #[must_use]
    pub fn count(&self) -> usize {
        self.snapshot().map_or(0, |wishlist| wishlist.len())
    }

    /// The last applied snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<WishlistSnapshot>> {
        self.inner.reconcile();
        self.inner.sync.snapshot()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> StorePhase {
        self.inner.reconcile();
        self.inner.sync.phase()
    }

    /// Whether a fetch is running.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.reconcile();
        self.inner.sync.is_loading()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::testing;

    #[tokio::test]
    async fn test_membership_follows_mutations() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/wishlist/add"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": {"items": [{"_id": "p1", "name": "Classic Aviator Gold"}]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/wishlist/remove/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": {"items": []}
            })))
            .mount(&server)
            .await;

        let store = WishlistStore::new(testing::signed_in_client(&server.uri(), "tok"));
        let id = ProductId::new("p1");

        let added = store.add(&id).await.unwrap();
        assert_eq!(added.message.as_deref(), Some("Added to wishlist"));
        assert!(store.is_member(&id));
        assert_eq!(store.count(), 1);

        let removed = store.remove(&id).await.unwrap();
        assert_eq!(removed.message.as_deref(), Some("Removed from wishlist"));
        assert!(!store.is_member(&id));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_calls_short_circuit() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let store = WishlistStore::new(testing::client(&server.uri()));
        let id = ProductId::new("p1");
        assert!(store.add(&id).await.unwrap().login_required);
        assert!(store.remove(&id).await.unwrap().login_required);
        assert!(store.clear().await.unwrap().login_required);
        assert!(store.refresh().await.unwrap().login_required);
        assert!(!store.is_member(&id));
    }

    #[tokio::test]
    async fn test_refused_add_keeps_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/wishlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": {"items": ["p1", "p1", "p2"]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/wishlist/add"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "success": false,
                "message": "Product already in wishlist"
            })))
            .mount(&server)
            .await;

        let store = WishlistStore::new(testing::signed_in_client(&server.uri(), "tok"));
        store.refresh().await.unwrap();
        assert_eq!(store.count(), 2);

        let result = store.add(&ProductId::new("p2")).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Product already in wishlist"));
        assert_eq!(store.count(), 2);
        assert_eq!(store.phase(), StorePhase::Ready);
    }

    #[tokio::test]
    async fn test_clear_replaces_snapshot_with_empty_wishlist() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/wishlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": {"items": ["p1", "p2"]}
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/wishlist/clear"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": {"items": []}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = WishlistStore::new(testing::signed_in_client(&server.uri(), "tok"));
        store.refresh().await.unwrap();
        assert_eq!(store.count(), 2);

        let result = store.clear().await.unwrap();
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Wishlist cleared"));

        let snapshot = store.snapshot().unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(store.count(), 0);
        assert!(!store.is_member(&ProductId::new("p1")));
        assert_eq!(store.phase(), StorePhase::Ready);
    }

    #[tokio::test]
    async fn test_cleared_event_resets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/wishlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "wishlist": {"items": ["p1"]}
            })))
            .mount(&server)
            .await;

        let client = testing::signed_in_client(&server.uri(), "tok");
        let store = WishlistStore::new(client.clone());
        store.refresh().await.unwrap();
        assert_eq!(store.count(), 1);

        client.session().storage().remove("token").unwrap();
        store.handle_event(SessionEvent::Cleared).await;
        assert_eq!(store.phase(), StorePhase::Unauthenticated);
        assert_eq!(store.count(), 0);
    }
}
