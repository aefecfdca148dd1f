//! REST client for the Opto-World backend.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; every endpoint answers with an envelope
//!   `{success, message?, <payload>}`
//! - The bearer token is read from [`Session`] on every request, so a login
//!   in another tab takes effect without rebuilding the client
//! - Catalog reads are cached in memory via `moka`; cart and wishlist never are.
//!   Catalog writes (deleting a product, writing a review) drop the cache
//! - Back-office calls (bookings, contacts, product removal) need an admin token
//!
//! # Outcomes
//!
//! Each call resolves to one of three outcomes:
//!
//! - `Ok(ApiResponse::Success { .. })`: the envelope said `success: true`.
//!   A missing payload decodes to its default (an empty cart, say).
//! - `Ok(ApiResponse::Failure(..))`: the server refused, either with a
//!   non-2xx JSON body or with `success: false`.
//! - `Err(ClientError)`: the request never produced an envelope (network
//!   failure, non-JSON error page, malformed JSON).
//!
//! # Example
//!
//! ```rust,ignore
//! use opto_world_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config, session)?;
//! match client.add_to_cart(&ProductId::new("p1"), 1).await? {
//!     ApiResponse::Success { data: cart, .. } => println!("{} items", cart.total_items),
//!     ApiResponse::Failure(failure) => println!("{}", failure.message),
//! }
//! ```

mod admin;
mod auth;
mod cache;
mod cart;
mod catalog;
mod forms;
mod reviews;
pub mod types;
mod wishlist;

pub use types::*;

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error};
use url::Url;

use crate::config::StorefrontConfig;
use crate::error::{ClientError, Result};
use crate::session::Session;

use cache::{CacheKey, CacheValue};

/// Message used when a failed envelope carries none.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// How much of an unexpected body to keep for diagnostics.
const BODY_EXCERPT_CHARS: usize = 500;

const CATALOG_CACHE_CAPACITY: u64 = 1000;

// =============================================================================
// Responses
// =============================================================================

/// A decoded API envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    /// `success: true` with its payload.
    Success {
        data: T,
        /// Optional human-readable message from the server.
        message: Option<String>,
    },
    /// The server refused the request.
    Failure(ApiFailure),
}

impl<T> ApiResponse<T> {
    /// Whether the server reported success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The payload, if successful.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Success { data, .. } => Some(data),
            Self::Failure(_) => None,
        }
    }

    /// The server's message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message, .. } => message.as_deref(),
            Self::Failure(failure) => Some(&failure.message),
        }
    }

    /// Transform the payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        match self {
            Self::Success { data, message } => ApiResponse::Success {
                data: f(data),
                message,
            },
            Self::Failure(failure) => ApiResponse::Failure(failure),
        }
    }

    /// Convert into a `Result`, dropping any success message.
    ///
    /// # Errors
    ///
    /// Returns the failure if the server refused the request.
    pub fn into_result(self) -> std::result::Result<T, ApiFailure> {
        match self {
            Self::Success { data, .. } => Ok(data),
            Self::Failure(failure) => Err(failure),
        }
    }
}

/// A refusal reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (HTTP {status})")]
pub struct ApiFailure {
    /// HTTP status of the response.
    pub status: u16,
    /// The server's message, or [`DEFAULT_FAILURE_MESSAGE`].
    pub message: String,
}

impl ApiFailure {
    /// Whether the server rejected the credentials.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED.as_u16()
    }
}

/// Whether a request carries the session's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Public,
    Bearer,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Opto-World REST API.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base: Url,
    session: Session,
    catalog: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config.api_url`, authenticating as `session`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig, session: Session) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("opto-world/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }

        let catalog = Cache::builder()
            .max_capacity(CATALOG_CACHE_CAPACITY)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http: builder.build()?,
                base: config.api_url.clone(),
                session,
                catalog,
            }),
        })
    }

    /// The session whose token this client sends.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate_all();
    }

    /// Build the URL for `segments` under the base, percent-encoding each.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.inner.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, auth: Auth) -> Result<RequestBuilder> {
        let mut builder = self.inner.http.request(method, url);
        if auth == Auth::Bearer {
            match self.inner.session.token()? {
                Some(token) => builder = builder.bearer_auth(token.expose_secret()),
                None => debug!("No session token; sending without credentials"),
            }
        }
        Ok(builder)
    }

    /// Send a request and decode its envelope.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>> {
        let response = request.send().await.inspect_err(|e| {
            error!(error = %e, "API request failed");
        })?;

        let status = response.status();
        let body = response.text().await?;
        decode_envelope(status, &body)
    }
}

/// Interpret a response body according to the envelope rules.
fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<ApiResponse<T>> {
    let object = match serde_json::from_str::<Map<String, Value>>(body) {
        Ok(object) => object,
        Err(e) if status.is_success() => {
            error!(
                error = %e,
                body = %excerpt(body),
                "Failed to parse API response"
            );
            return Err(ClientError::Parse(e));
        }
        Err(_) => {
            error!(
                status = %status,
                body = %excerpt(body),
                "API returned non-success status without a JSON body"
            );
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                body: excerpt(body),
            });
        }
    };

    let success = object.get("success").and_then(Value::as_bool).unwrap_or(false);
    let message = object
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_owned);

    if !status.is_success() || !success {
        let failure = ApiFailure {
            status: status.as_u16(),
            message: message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string()),
        };
        debug!(status = failure.status, message = %failure.message, "API refused request");
        return Ok(ApiResponse::Failure(failure));
    }

    let data = serde_json::from_value(Value::Object(object)).inspect_err(|e| {
        error!(error = %e, body = %excerpt(body), "Failed to decode API payload");
    })?;
    Ok(ApiResponse::Success { data, message })
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers shared by the client and store tests.

    use crate::config::StorefrontConfig;
    use crate::events::EventBus;
    use crate::session::{Session, SessionProfile};
    use crate::storage::OriginStorage;

    use super::ApiClient;

    /// A client pointed at `server_uri` with a fresh in-memory session.
    #[allow(clippy::unwrap_used)]
    pub fn client(server_uri: &str) -> ApiClient {
        let config = StorefrontConfig::with_api_url(&format!("{server_uri}/api")).unwrap();
        let session = Session::new(OriginStorage::memory().open_tab(), EventBus::new());
        ApiClient::new(&config, session).unwrap()
    }

    /// Same as [`client`], already signed in with `token`.
    #[allow(clippy::unwrap_used)]
    pub fn signed_in_client(server_uri: &str, token: &str) -> ApiClient {
        let client = client(server_uri);
        client
            .session()
            .set_session(
                &secrecy::SecretString::from(token.to_string()),
                &SessionProfile::default(),
            )
            .unwrap();
        client
    }
}
