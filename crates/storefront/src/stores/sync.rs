//! Shared machinery behind [`CartStore`](super::CartStore) and
//! [`WishlistStore`](super::WishlistStore).

use std::future::Future;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{LoginRedirect, StorePhase, StoreResult};
use crate::api::{ApiClient, ApiResponse};
use crate::error::Result;
use crate::events::SessionEvent;

/// A server document mirrored by a store.
pub(crate) trait Snapshot: Send + Sync + Sized + 'static {
    /// Used in log messages.
    const NAME: &'static str;

    /// Returned when a read needs a session.
    const LOGIN_MESSAGE: &'static str;

    /// Load the current document from the server.
    fn fetch(api: &ApiClient) -> impl Future<Output = Result<ApiResponse<Self>>> + Send;
}

/// Whether a request loads state or changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    Fetch,
    Mutation,
}

// =============================================================================
// Synchronizer
// =============================================================================

/// Snapshot slot guarded by request sequence numbers.
pub(crate) struct Synchronizer<S> {
    state: Mutex<SyncState<S>>,
}

struct SyncState<S> {
    snapshot: Option<Arc<S>>,
    authenticated: bool,
    /// Signed in but no fetch has finished yet.
    awaiting_fetch: bool,
    /// Last sequence number handed out.
    issued: u64,
    /// Sequence number of the applied snapshot, or the reset floor.
    applied: u64,
    /// Requests issued at or below this number belong to an old session.
    floor: u64,
    in_flight: usize,
    fetches_in_flight: usize,
}

impl<S> Synchronizer<S> {
    pub(crate) fn new(authenticated: bool) -> Self {
        Self {
            state: Mutex::new(SyncState {
                snapshot: None,
                authenticated,
                awaiting_fetch: authenticated,
                issued: 0,
                applied: 0,
                floor: 0,
                in_flight: 0,
                fetches_in_flight: 0,
            }),
        }
    }

    /// Stamp a new request.
    pub(crate) fn begin(&self, kind: RequestKind) -> Ticket<'_, S> {
        let mut state = self.state.lock();
        state.issued += 1;
        state.in_flight += 1;
        if kind == RequestKind::Fetch {
            state.fetches_in_flight += 1;
        }
        Ticket {
            sync: self,
            seq: state.issued,
            kind,
        }
    }

    /// Enter the signed-in state. Returns `true` if this was a transition.
    pub(crate) fn authenticate(&self) -> bool {
        let mut state = self.state.lock();
        if state.authenticated {
            return false;
        }
        state.authenticated = true;
        state.awaiting_fetch = state.snapshot.is_none();
        true
    }

    /// Drop the snapshot and orphan every request in flight.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock();
        if state.authenticated || state.snapshot.is_some() {
            debug!(discarded = state.in_flight, "Resetting store");
        }
        state.snapshot = None;
        state.authenticated = false;
        state.awaiting_fetch = false;
        state.applied = state.issued;
        state.floor = state.issued;
        state.in_flight = 0;
        state.fetches_in_flight = 0;
    }

    pub(crate) fn snapshot(&self) -> Option<Arc<S>> {
        self.state.lock().snapshot.clone()
    }

    pub(crate) fn phase(&self) -> StorePhase {
        let state = self.state.lock();
        if !state.authenticated {
            StorePhase::Unauthenticated
        } else if state.in_flight > 0 || state.awaiting_fetch {
            StorePhase::Loading
        } else {
            StorePhase::Ready
        }
    }

    /// Only fetches count; mutations keep the current snapshot on screen.
    pub(crate) fn is_loading(&self) -> bool {
        let state = self.state.lock();
        state.authenticated && (state.fetches_in_flight > 0 || state.awaiting_fetch)
    }
}

/// An issued request. Dropping it marks the request finished.
pub(crate) struct Ticket<'a, S> {
    sync: &'a Synchronizer<S>,
    seq: u64,
    kind: RequestKind,
}

impl<S> Ticket<'_, S> {
    pub(crate) const fn seq(&self) -> u64 {
        self.seq
    }

    /// Install `snapshot` unless a newer response already has.
    pub(crate) fn apply(&self, snapshot: Arc<S>) -> bool {
        let mut state = self.sync.state.lock();
        if self.seq <= state.applied {
            return false;
        }
        state.snapshot = Some(snapshot);
        state.applied = self.seq;
        state.awaiting_fetch = false;
        true
    }
}

impl<S> Drop for Ticket<'_, S> {
    fn drop(&mut self) {
        let mut state = self.sync.state.lock();
        if self.seq <= state.floor {
            return;
        }
        state.in_flight = state.in_flight.saturating_sub(1);
        if self.kind == RequestKind::Fetch {
            state.fetches_in_flight = state.fetches_in_flight.saturating_sub(1);
            state.awaiting_fetch = false;
        }
    }
}

// =============================================================================
// StoreCore
// =============================================================================

/// Session tracking, request running and event handling for one store.
pub(crate) struct StoreCore<S> {
    pub(crate) api: ApiClient,
    pub(crate) sync: Synchronizer<S>,
    login_redirect: RwLock<Option<LoginRedirect>>,
}

impl<S: Snapshot> StoreCore<S> {
    pub(crate) fn new(api: ApiClient) -> Self {
        let authenticated = api.session().is_authenticated();
        Self {
            api,
            sync: Synchronizer::new(authenticated),
            login_redirect: RwLock::new(None),
        }
    }

    pub(crate) fn set_login_redirect(&self, hook: Option<LoginRedirect>) {
        *self.login_redirect.write() = hook;
    }

    /// Align the store with durable session state. Returns whether a
    /// session exists.
    pub(crate) fn ensure_session(&self) -> bool {
        if self.api.session().is_authenticated() {
            if self.sync.authenticate() {
                debug!(store = S::NAME, "Store joined session");
            }
            true
        } else {
            self.sync.reset();
            false
        }
    }

    /// Drop state if the session is gone. Never starts a session.
    pub(crate) fn reconcile(&self) {
        if !self.api.session().is_authenticated() {
            self.sync.reset();
        }
    }

    /// Short-circuit result for an operation that needs a session.
    pub(crate) fn login_required<T>(&self, message: &str, redirect: bool) -> StoreResult<T> {
        debug!(store = S::NAME, "Operation requires login");
        if redirect {
            // Clone out so the hook runs without the lock held.
            let hook = self.login_redirect.read().clone();
            if let Some(hook) = hook {
                hook();
            }
        }
        StoreResult::login_required(message)
    }

    /// Issue `call` under a fresh sequence number and apply its snapshot.
    pub(crate) async fn run(
        &self,
        kind: RequestKind,
        call: impl Future<Output = Result<ApiResponse<S>>>,
    ) -> Result<StoreResult<Arc<S>>> {
        let ticket = self.sync.begin(kind);
        let response = call.await?;

        Ok(match response {
            ApiResponse::Success { data, message } => {
                let data = Arc::new(data);
                if ticket.apply(Arc::clone(&data)) {
                    debug!(store = S::NAME, seq = ticket.seq(), "Applied snapshot");
                } else {
                    debug!(store = S::NAME, seq = ticket.seq(), "Discarded stale snapshot");
                }
                StoreResult::ok(data, message)
            }
            ApiResponse::Failure(failure) => {
                warn!(
                    store = S::NAME,
                    status = failure.status,
                    message = %failure.message,
                    "Request refused"
                );
                StoreResult::refused(failure)
            }
        })
    }

    /// Reload from the server.
    pub(crate) async fn refresh(&self) -> Result<StoreResult<Arc<S>>> {
        if !self.ensure_session() {
            return Ok(StoreResult::login_required(S::LOGIN_MESSAGE));
        }
        self.run(RequestKind::Fetch, S::fetch(&self.api)).await
    }

    /// Re-read the session and fetch if signed in.
    ///
    /// With `reset`, the current snapshot is dropped first so nothing from a
    /// previous session survives.
    pub(crate) async fn resync(&self, reset: bool) {
        if reset {
            self.sync.reset();
        }
        if !self.ensure_session() {
            return;
        }
        match self.refresh().await {
            Ok(result) if !result.success => {
                debug!(store = S::NAME, message = ?result.message, "Background fetch refused");
            }
            Ok(_) => {}
            Err(e) => warn!(store = S::NAME, error = %e, "Background fetch failed"),
        }
    }

    pub(crate) async fn handle_event(&self, event: SessionEvent) {
        debug!(store = S::NAME, ?event, "Session event");
        self.resync(event == SessionEvent::Cleared).await;
    }

    /// Fetch if signed in, then follow session events until the store is
    /// dropped or the bus closes.
    pub(crate) fn attach(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.api.session().subscribe();
        let weak: Weak<Self> = Arc::downgrade(self);
        let needs_fetch = self.api.session().is_authenticated() && self.sync.snapshot().is_none();

        tokio::spawn(async move {
            if needs_fetch && let Some(core) = weak.upgrade() {
                core.resync(false).await;
            }

            loop {
                let event = match events.recv().await {
                    Ok(event) => Some(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(store = S::NAME, skipped, "Session listener lagged; resyncing");
                        None
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(core) = weak.upgrade() else { break };
                match event {
                    Some(event) => core.handle_event(event).await,
                    None => core.resync(true).await,
                }
            }
            debug!(store = S::NAME, "Session listener stopped");
        })
    }
}
