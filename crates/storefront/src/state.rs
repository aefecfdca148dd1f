//! Per-tab client state.
//!
//! A [`Storefront`] is what one browser tab would hold: its storage handle,
//! event bus, session, API client, both stores, and the auth service. Tabs of
//! the same origin share durable storage through an [`OriginStorage`] and
//! learn about each other's sign-ins through the storage bridge.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::config::StorefrontConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::services::AuthService;
use crate::session::Session;
use crate::storage::{OriginStorage, TabId};
use crate::stores::{CartStore, LoginRedirect, WishlistStore};

/// Everything one tab needs, cheaply cloneable via `Arc`.
///
/// Background tasks started by [`Storefront::start`] are aborted when the
/// last clone is dropped.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    tab_id: TabId,
    session: Session,
    api: ApiClient,
    cart: CartStore,
    wishlist: WishlistStore,
    auth: AuthService,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Drop for StorefrontInner {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().drain(..) {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("tab_id", &self.inner.tab_id)
            .field("cart", &self.inner.cart)
            .field("wishlist", &self.inner.wishlist)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Open a new tab on `origin`.
    ///
    /// Nothing runs until [`Storefront::start`] is called.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig, origin: &OriginStorage) -> Result<Self> {
        let storage = origin.open_tab();
        let tab_id = storage.tab_id();
        let session = Session::new(storage, EventBus::new());
        let api = ApiClient::new(config, session.clone())?;

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                tab_id,
                cart: CartStore::new(api.clone()),
                wishlist: WishlistStore::new(api.clone()),
                auth: AuthService::new(api.clone()),
                session,
                api,
                tasks: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Start following session changes from this and other tabs.
    ///
    /// Both stores fetch immediately if a session already exists. Calling
    /// this more than once has no effect.
    pub fn start(&self) {
        let mut tasks = self.inner.tasks.lock();
        if !tasks.is_empty() {
            debug!(tab = %self.inner.tab_id, "Storefront already started");
            return;
        }

        // Store listeners subscribe before the bridge can publish anything.
        tasks.push(self.inner.cart.attach());
        tasks.push(self.inner.wishlist.attach());
        tasks.push(
            self.inner
                .session
                .bus()
                .bridge_storage(self.inner.session.storage().clone()),
        );
        info!(tab = %self.inner.tab_id, "Storefront started");
    }

    /// Install the same sign-in redirect on both stores.
    pub fn set_login_redirect(&self, hook: Option<LoginRedirect>) {
        self.inner.cart.set_login_redirect(hook.clone());
        self.inner.wishlist.set_login_redirect(hook);
    }

    /// This tab's identity within the origin.
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.inner.tab_id
    }

    /// The tab's session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// The REST client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// The wishlist store.
    #[must_use]
    pub fn wishlist(&self) -> &WishlistStore {
        &self.inner.wishlist
    }

    /// Login, signup and logout.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}
