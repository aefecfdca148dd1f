//! Auth endpoints.
//!
//! These only talk to the backend. Persisting the returned token is up to
//! the caller (see [`crate::services::AuthService`]).

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::types::{AuthSession, UserProfile, null_as_default};
use super::{ApiClient, ApiFailure, ApiResponse, Auth};
use crate::error::Result;

#[derive(Deserialize)]
struct AuthEnvelope {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    user: UserProfile,
}

#[derive(Deserialize)]
struct UserEnvelope {
    #[serde(default, deserialize_with = "null_as_default")]
    user: UserProfile,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
    confirm_password: &'a str,
}

impl ApiClient {
    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self, password))]
    pub async fn auth_login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<ApiResponse<AuthSession>> {
        let url = self.endpoint(&["auth", "login"])?;
        let request = self
            .request(Method::POST, url, Auth::Public)?
            .json(&LoginBody {
                email,
                password: password.expose_secret(),
            });
        Ok(into_session(self.execute::<AuthEnvelope>(request).await?))
    }

    /// Create an account. The backend checks that the passwords match.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self, password, confirm_password))]
    pub async fn auth_signup(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<ApiResponse<AuthSession>> {
        let url = self.endpoint(&["auth", "signup"])?;
        let request = self
            .request(Method::POST, url, Auth::Public)?
            .json(&SignupBody {
                name,
                email,
                password: password.expose_secret(),
                confirm_password: confirm_password.expose_secret(),
            });
        Ok(into_session(self.execute::<AuthEnvelope>(request).await?))
    }

    /// Create another administrator account.
    ///
    /// Sent with the current admin's token. The new account's token, if
    /// any, is discarded so the caller stays signed in as themselves.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self, password, confirm_password))]
    pub async fn admin_signup(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
        confirm_password: &SecretString,
    ) -> Result<ApiResponse<UserProfile>> {
        let url = self.endpoint(&["auth", "admin-signup"])?;
        let request = self
            .request(Method::POST, url, Auth::Bearer)?
            .json(&SignupBody {
                name,
                email,
                password: password.expose_secret(),
                confirm_password: confirm_password.expose_secret(),
            });
        Ok(self.execute::<AuthEnvelope>(request).await?.map(|e| e.user))
    }

    /// The profile of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    #[instrument(skip(self))]
    pub async fn auth_me(&self) -> Result<ApiResponse<UserProfile>> {
        let url = self.endpoint(&["auth", "me"])?;
        let request = self.request(Method::GET, url, Auth::Bearer)?;
        Ok(self.execute::<UserEnvelope>(request).await?.map(|e| e.user))
    }
}

/// A success without a token cannot start a session.
fn into_session(response: ApiResponse<AuthEnvelope>) -> ApiResponse<AuthSession> {
    match response {
        ApiResponse::Success { data, message } => match data.token.filter(|t| !t.is_empty()) {
            Some(token) => ApiResponse::Success {
                data: AuthSession {
                    token: SecretString::from(token),
                    user: data.user,
                },
                message,
            },
            None => {
                warn!("Auth response reported success without a token");
                ApiResponse::Failure(ApiFailure {
                    status: StatusCode::OK.as_u16(),
                    message: "Authentication response did not include a token".to_string(),
                })
            }
        },
        ApiResponse::Failure(failure) => ApiResponse::Failure(failure),
    }
}
