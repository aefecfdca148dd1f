//! Session state persisted in durable storage.
//!
//! The bearer token and a cached copy of the user's profile live in the
//! origin's [`LocalStorage`] so that every tab sees the same sign-in. The
//! profile is advisory; the backend stays the source of truth.
//!
//! Writes are ordered so that other tabs never observe a token without its
//! profile: [`Session::set_session`] writes the profile first and the token
//! last, and [`Session::clear_session`] removes the token first.

use opto_world_core::{Email, UserRole};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use crate::events::{EventBus, SessionEvent};
use crate::storage::{LocalStorage, StorageError};

/// Durable storage keys owned by the session.
pub mod keys {
    /// Bearer token.
    pub const TOKEN: &str = "token";
    /// Display name.
    pub const USER_NAME: &str = "userName";
    /// Email address.
    pub const USER_EMAIL: &str = "userEmail";
    /// `user` or `admin`.
    pub const USER_ROLE: &str = "userRole";
    /// Phone number.
    pub const USER_PHONE: &str = "userPhone";
    /// Postal address.
    pub const USER_ADDRESS: &str = "userAddress";

    /// Profile keys, in write order.
    pub const PROFILE: [&str; 5] = [USER_NAME, USER_EMAIL, USER_ROLE, USER_PHONE, USER_ADDRESS];
}

/// Cached user attributes stored next to the token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionProfile {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
}

/// Handle on the current tab's session.
///
/// Cloning is cheap; clones share the same storage and event bus.
#[derive(Clone)]
pub struct Session {
    storage: LocalStorage,
    bus: EventBus,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("storage", &self.storage)
            .field("authenticated", &self.is_authenticated())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session over a tab's storage, publishing on `bus`.
    #[must_use]
    pub const fn new(storage: LocalStorage, bus: EventBus) -> Self {
        Self { storage, bus }
    }

    /// Store a new token and profile, then publish [`SessionEvent::Established`].
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written. No event is published
    /// in that case.
    #[instrument(skip_all)]
    pub fn set_session(
        &self,
        token: &SecretString,
        profile: &SessionProfile,
    ) -> Result<(), StorageError> {
        self.write_profile(profile)?;
        self.storage.set(keys::TOKEN, token.expose_secret())?;
        info!(role = %profile.role, "Session established");
        self.bus.publish(SessionEvent::Established);
        Ok(())
    }

    /// Remove the token and profile, then publish [`SessionEvent::Cleared`].
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    #[instrument(skip_all)]
    pub fn clear_session(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::TOKEN)?;
        for key in keys::PROFILE {
            self.storage.remove(key)?;
        }
        info!("Session cleared");
        self.bus.publish(SessionEvent::Cleared);
        Ok(())
    }

    /// Overwrite the cached profile without touching the token.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn update_profile(&self, profile: &SessionProfile) -> Result<(), StorageError> {
        self.write_profile(profile)
    }

    /// Whether a non-empty token is stored.
    ///
    /// A storage read failure counts as signed out.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        match self.token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                warn!(error = %e, "Failed to read session token");
                false
            }
        }
    }

    /// The stored bearer token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn token(&self) -> Result<Option<SecretString>, StorageError> {
        Ok(self
            .storage
            .get(keys::TOKEN)?
            .filter(|t| !t.is_empty())
            .map(SecretString::from))
    }

    /// The cached profile. Missing fields are `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn profile(&self) -> Result<SessionProfile, StorageError> {
        let email = self.storage.get(keys::USER_EMAIL)?.and_then(|raw| {
            Email::parse(&raw)
                .inspect_err(|e| debug!(error = %e, "Ignoring stored email"))
                .ok()
        });

        Ok(SessionProfile {
            name: self.non_empty(keys::USER_NAME)?,
            email,
            phone: self.non_empty(keys::USER_PHONE)?,
            address: self.non_empty(keys::USER_ADDRESS)?,
            role: self.role(),
        })
    }

    /// The cached role; `user` when absent or unrecognized.
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.storage
            .get(keys::USER_ROLE)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// Subscribe to this tab's session events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    /// The bus this session publishes on.
    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The tab's storage handle.
    #[must_use]
    pub const fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    fn write_profile(&self, profile: &SessionProfile) -> Result<(), StorageError> {
        self.write_optional(keys::USER_NAME, profile.name.as_deref())?;
        self.write_optional(keys::USER_EMAIL, profile.email.as_ref().map(Email::as_str))?;
        self.storage.set(keys::USER_ROLE, profile.role.as_str())?;
        self.write_optional(keys::USER_PHONE, profile.phone.as_deref())?;
        self.write_optional(keys::USER_ADDRESS, profile.address.as_deref())
    }

    fn write_optional(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        match value {
            Some(v) if !v.is_empty() => self.storage.set(key, v),
            _ => self.storage.remove(key),
        }
    }

    fn non_empty(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.storage.get(key)?.filter(|v| !v.is_empty()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{ForeignChange, OriginStorage};

    fn session() -> Session {
        Session::new(OriginStorage::memory().open_tab(), EventBus::new())
    }

    fn profile() -> SessionProfile {
        SessionProfile {
            name: Some("Asha Rao".to_string()),
            email: Some(Email::parse("asha@example.com").unwrap()),
            phone: Some("+91 98765 43210".to_string()),
            address: None,
            role: UserRole::Admin,
        }
    }

    #[test]
    fn test_set_and_read_back() {
        let session = session();
        assert!(!session.is_authenticated());

        session
            .set_session(&SecretString::from("tok-1".to_string()), &profile())
            .unwrap();

        assert!(session.is_authenticated());
        assert_eq!(session.token().unwrap().unwrap().expose_secret(), "tok-1");
        assert_eq!(session.profile().unwrap(), profile());
        assert_eq!(session.role(), UserRole::Admin);
    }

    #[test]
    fn test_clear_removes_everything() {
        let session = session();
        session
            .set_session(&SecretString::from("tok-1".to_string()), &profile())
            .unwrap();
        session.clear_session().unwrap();

        assert!(!session.is_authenticated());
        assert_eq!(session.profile().unwrap(), SessionProfile::default());
        for key in keys::PROFILE {
            assert_eq!(session.storage().get(key).unwrap(), None);
        }
    }

    #[test]
    fn test_empty_token_is_unauthenticated() {
        let session = session();
        session.storage().set(keys::TOKEN, "").unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_unknown_role_defaults_to_user() {
        let session = session();
        session.storage().set(keys::USER_ROLE, "owner").unwrap();
        assert_eq!(session.role(), UserRole::User);
    }

    #[tokio::test]
    async fn test_events_published() {
        let session = session();
        let mut rx = session.subscribe();

        session
            .set_session(&SecretString::from("tok".to_string()), &profile())
            .unwrap();
        session.clear_session().unwrap();

        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Established);
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::Cleared);
    }

    #[tokio::test]
    async fn test_token_written_last_and_removed_first() {
        let origin = OriginStorage::memory();
        let session = Session::new(origin.open_tab(), EventBus::new());
        let mut other_tab = origin.open_tab().subscribe_foreign();

        session
            .set_session(&SecretString::from("tok".to_string()), &profile())
            .unwrap();
        let mut set_order = Vec::new();
        for _ in 0..6 {
            set_order.push(other_tab.recv().await.unwrap());
        }
        assert_eq!(set_order.last(), Some(&ForeignChange::Key(keys::TOKEN.to_string())));

        session.clear_session().unwrap();
        assert_eq!(
            other_tab.recv().await.unwrap(),
            ForeignChange::Key(keys::TOKEN.to_string())
        );
    }
}
