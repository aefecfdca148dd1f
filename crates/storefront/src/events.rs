//! Typed session event bus.
//!
//! Every tab owns one [`EventBus`]. Local session changes publish directly;
//! changes made by other tabs arrive through [`EventBus::bridge_storage`],
//! which watches the shared `token` key and republishes what it finds.

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::session::keys;
use crate::storage::{ForeignChange, LocalStorage};

/// Capacity of the per-tab event channel.
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Authentication state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// A token was stored; the user is signed in.
    Established,
    /// The token was removed; the user is signed out.
    Cleared,
}

/// Publish/subscribe channel for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Deliver `event` to every live subscriber.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, event: SessionEvent) -> usize {
        let reached = self.tx.send(event).unwrap_or(0);
        debug!(?event, reached, "Published session event");
        reached
    }

    /// Subscribe to future events. Earlier events are not replayed.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Republish token changes made by other tabs on this bus.
    ///
    /// The task re-reads the token on every foreign change of the `token`
    /// key (and after a lagged listener resyncs), then publishes
    /// [`SessionEvent::Established`] or [`SessionEvent::Cleared`]. It runs
    /// until the origin is dropped or the handle is aborted.
    #[instrument(skip_all, fields(tab = %storage.tab_id()))]
    pub fn bridge_storage(&self, storage: LocalStorage) -> JoinHandle<()> {
        let bus = self.clone();
        let mut changes = storage.subscribe_foreign();

        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                match change {
                    ForeignChange::Key(key) if key == keys::TOKEN => {}
                    ForeignChange::Key(_) => continue,
                    ForeignChange::Resync => debug!("Resyncing session from storage"),
                }

                let event = match storage.get(keys::TOKEN) {
                    Ok(Some(token)) if !token.is_empty() => SessionEvent::Established,
                    Ok(_) => SessionEvent::Cleared,
                    Err(e) => {
                        warn!(error = %e, "Failed to read token after foreign change");
                        continue;
                    }
                };
                bus.publish(event);
            }
            debug!("Storage bridge stopped");
        })
    }
}
