//! Authentication service.
//!
//! Wraps the auth endpoints and keeps [`Session`] in step with them: a
//! successful login or signup stores the token and profile (which publishes
//! [`SessionEvent::Established`](crate::events::SessionEvent)), logout clears
//! them, and a profile refresh rejected with 401 signs the user out.

mod error;

pub use error::AuthError;

use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use opto_world_core::Email;

use crate::api::{ApiClient, ApiResponse, AuthSession, UserProfile};
use crate::session::{Session, SessionProfile};

/// Minimum password length accepted by the backend.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication service.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn session(&self) -> &Session {
        self.api.session()
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Sign in and store the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::Rejected` if the backend refuses the credentials.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(AuthError::WeakPassword("password is required".to_string()));
        }

        let response = self.api.auth_login(email.as_str(), password).await?;
        self.establish(response)
    }

    /// Create an account and store the session.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request is made if the name is
    /// empty, the email is malformed, the password is shorter than six
    /// characters, or the confirmation differs. Returns
    /// `AuthError::Rejected` if the backend refuses (e.g. email taken).
    #[instrument(skip(self, password, confirm_password))]
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<UserProfile, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(email)?;
        validate_password(password.expose_secret())?;
        if password.expose_secret() != confirm_password.expose_secret() {
            return Err(AuthError::PasswordMismatch);
        }

        let response = self
            .api
            .auth_signup(name, email.as_str(), password, confirm_password)
            .await?;
        self.establish(response)
    }

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.session().clear_session()?;
        Ok(())
    }

    /// Reload the profile from the backend and cache it.
    ///
    /// A 401 means the stored token is no longer valid; the session is
    /// cleared before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Rejected` if the backend refuses.
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> Result<UserProfile, AuthError> {
        match self.api.auth_me().await? {
            ApiResponse::Success { data: user, .. } => {
                self.session().update_profile(&session_profile(&user))?;
                Ok(user)
            }
            ApiResponse::Failure(failure) => {
                if failure.is_unauthorized() {
                    warn!("Stored token rejected; signing out");
                    self.session().clear_session()?;
                }
                Err(AuthError::Rejected(failure))
            }
        }
    }

    fn establish(&self, response: ApiResponse<AuthSession>) -> Result<UserProfile, AuthError> {
        let AuthSession { token, user } = response.into_result().map_err(AuthError::Rejected)?;
        self.session().set_session(&token, &session_profile(&user))?;
        info!(role = %user.role, "Signed in");
        Ok(user)
    }
}

/// The cached subset of a user document.
fn session_profile(user: &UserProfile) -> SessionProfile {
    SessionProfile {
        name: Some(user.name.clone()).filter(|n| !n.is_empty()),
        email: Email::parse(&user.email).ok(),
        phone: user.phone.clone(),
        address: user.address.clone(),
        role: user.role,
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
