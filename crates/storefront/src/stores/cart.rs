//! Cart store.

use std::sync::Arc;

use opto_world_core::{CurrencyCode, Price, ProductId};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::instrument;

use super::sync::{RequestKind, Snapshot, StoreCore};
use super::{LoginRedirect, StorePhase, StoreResult};
use crate::api::{ApiClient, ApiResponse, CartSnapshot};
use crate::error::Result;
use crate::events::SessionEvent;

const LOGIN_TO_ADD: &str = "Please login to add items to cart";
const LOGIN_TO_MANAGE: &str = "Please login to manage your cart";
const QUANTITY_TOO_LOW: &str = "Quantity must be at least 1";

impl Snapshot for CartSnapshot {
    const NAME: &'static str = "cart";
    const LOGIN_MESSAGE: &'static str = LOGIN_TO_MANAGE;

    fn fetch(api: &ApiClient) -> impl Future<Output = Result<ApiResponse<Self>>> + Send {
        api.get_cart()
    }
}

/// Client-side mirror of the signed-in user's cart.
///
/// Cloning is cheap; clones share one snapshot.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<StoreCore<CartSnapshot>>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("phase", &self.inner.sync.phase())
            .field(
                "count",
                &self.inner.sync.snapshot().map_or(0, |cart| cart.total_items),
            )
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Create a store that authenticates through `api`'s session.
    ///
    /// Nothing is fetched until [`attach`](Self::attach) or
    /// [`refresh`](Self::refresh) is called.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self {
            inner: Arc::new(StoreCore::new(api)),
        }
    }

    /// Install a callback run when an add, update or remove is attempted
    /// without a session.
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

    /// Add `quantity` units of a product.
    ///
    /// Refused locally when nobody is signed in, when `quantity` is zero, or
    /// when the cart already holds the product and the result would exceed
    /// its known stock.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StoreResult<Arc<CartSnapshot>>> {
        if !self.inner.ensure_session() {
            return Ok(self.inner.login_required(LOGIN_TO_ADD, true));
        }
        if quantity < 1 {
            return Ok(StoreResult::rejected(QUANTITY_TOO_LOW));
        }
        if let Some(line) = self.line(product_id)
            && let Some(stock) = line.product.stock
            && line.quantity.saturating_add(quantity) > stock
        {
            return Ok(StoreResult::rejected(format!(
                "Cannot add more items. Only {stock} available in stock."
            )));
        }

        let mut result = self
            .inner
            .run(
                RequestKind::Mutation,
                self.inner.api.add_to_cart(product_id, quantity),
            )
            .await?;
        if result.success {
            result.message = Some("Product added to cart!".to_string());
        }
        Ok(result)
    }

    /// Set a line's quantity.
    ///
    /// Zero is refused without a request, as is a quantity above the line's
    /// known stock.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<StoreResult<Arc<CartSnapshot>>> {
        if !self.inner.ensure_session() {
            return Ok(self.inner.login_required(LOGIN_TO_MANAGE, true));
        }
        if quantity < 1 {
            return Ok(StoreResult::rejected(QUANTITY_TOO_LOW));
        }
        if let Some(stock) = self.line(product_id).and_then(|line| line.product.stock)
            && quantity > stock
        {
            return Ok(StoreResult::rejected(format!(
                "Only {stock} available in stock."
            )));
        }

        self.inner
            .run(
                RequestKind::Mutation,
                self.inner.api.update_cart_item(product_id, quantity),
            )
            .await
    }

    /// Remove a line. Removing an absent line is the server's call.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(
        &self,
        product_id: &ProductId,
    ) -> Result<StoreResult<Arc<CartSnapshot>>> {
        if !self.inner.ensure_session() {
            return Ok(self.inner.login_required(LOGIN_TO_MANAGE, true));
        }

        let mut result = self
            .inner
            .run(
                RequestKind::Mutation,
                self.inner.api.remove_cart_item(product_id),
            )
            .await?;
        if result.success {
            result.message = Some("Product removed from cart".to_string());
        }
        Ok(result)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<StoreResult<Arc<CartSnapshot>>> {
        if !self.inner.ensure_session() {
            return Ok(self.inner.login_required(LOGIN_TO_MANAGE, false));
        }
        self.inner
            .run(RequestKind::Mutation, self.inner.api.clear_cart())
            .await
    }

    /// Reload the cart from the server.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<StoreResult<Arc<CartSnapshot>>> {
        self.inner.refresh().await
    }

    /// The last applied snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<CartSnapshot>> {
        self.inner.reconcile();
        self.inner.sync.snapshot()
    }

    /// Server-computed item count, or 0 without a snapshot.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.snapshot().map_or(0, |cart| cart.total_items)
    }

    /// Server-computed total, or 0 without a snapshot.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.snapshot().map_or(Decimal::ZERO, |cart| cart.total_price)
    }

    /// [`total`](Self::total) as a displayable price.
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::new(self.total(), CurrencyCode::INR)
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> StorePhase {
        self.inner.reconcile();
        self.inner.sync.phase()
    }

    /// Whether a fetch is running. Mutations do not raise this.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.reconcile();
        self.inner.sync.is_loading()
    }

    fn line(&self, product_id: &ProductId) -> Option<crate::api::CartLine> {
        self.inner
            .sync
            .snapshot()
            .and_then(|cart| cart.line(product_id).cloned())
    }
}
