//! HTTP plumbing shared by every endpoint group.
//!
//! One request per call: no retries, no request coalescing, no debouncing.
//! Endpoint groups live in [`crate::api`] as further `impl ApiClient` blocks.

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};
use url::Url;

use crate::api::cache::{CacheKey, CacheValue};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::session::Session;

/// Upper bound on cached catalog entries.
const CACHE_CAPACITY: u64 = 500;

/// Client for the Cake Shop REST API.
///
/// Cheap to clone; clones share the connection pool and the catalog cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Shape of an error body. The backend uses `message`, a few routes `error`.
#[derive(serde::Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl ApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Request` if the HTTP client cannot be built
    /// (e.g. the TLS backend fails to initialize).
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cake-shop-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.clone(),
                cache,
            }),
        })
    }

    /// Base URL endpoint paths are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub(crate) fn cache(&self) -> &Cache<CacheKey, CacheValue> {
        &self.inner.cache
    }

    /// Resolve a relative endpoint path such as `cakes/123`.
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::InvalidInput(format!("invalid endpoint '{path}': {e}")))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
    ) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        let builder = self.inner.http.request(method, url);
        Ok(match session {
            Some(session) => builder.bearer_auth(session.access_token().expose_secret()),
            None => builder,
        })
    }

    /// Send a request and decode the JSON response.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let text = self.execute_raw(builder).await?;
        serde_json::from_str(&text).map_err(|e| {
            error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request, map failure statuses to errors, return the body text.
    async fn execute_raw(&self, builder: RequestBuilder) -> Result<String> {
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Backend request failed");
            ApiError::Request(e)
        })?;

        let status = response.status();
        let url = response.url().path().to_string();
        let body = response.text().await?;

        if status.is_success() {
            debug!(status = %status, path = %url, "Backend request succeeded");
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .filter(|m| !m.trim().is_empty());

        if status == StatusCode::UNAUTHORIZED {
            warn!(path = %url, "Backend rejected credentials");
            return Err(ApiError::Unauthorized { message });
        }

        error!(
            status = %status,
            path = %url,
            message = ?message,
            "Backend returned non-success status"
        );
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        session: Option<&Session>,
    ) -> Result<T> {
        self.fetch(Method::GET, path, session).await
    }

    /// Bodiless request with a JSON response.
    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
    ) -> Result<T> {
        self.execute(self.request(method, path, session)?).await
    }

    /// `GET` with query parameters appended to the URL.
    pub(crate) async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        session: Option<&Session>,
    ) -> Result<T> {
        let mut url = self.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let mut builder = self.inner.http.get(url);
        if let Some(session) = session {
            builder = builder.bearer_auth(session.access_token().expose_secret());
        }
        self.execute(builder).await
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        session: Option<&Session>,
    ) -> Result<T> {
        self.execute(self.request(method, path, session)?.json(body))
            .await
    }

    /// Send a request whose response body is irrelevant.
    pub(crate) async fn send_unit<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        session: Option<&Session>,
    ) -> Result<()> {
        let mut builder = self.request(method, path, session)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute_raw(builder).await.map(|_| ())
    }

    /// Fail fast when a non-admin session calls an admin endpoint.
    pub(crate) fn require_admin(session: &Session) -> Result<()> {
        if session.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "This action requires an admin account".to_string(),
            ))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cake_shop_core::{UserId, UserRole};
    use secrecy::SecretString;

    use super::*;

    fn client() -> ApiClient {
        ApiClient::new(&ClientConfig::with_api_url("https://api.example.com/api").unwrap())
            .unwrap()
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let client = client();
        assert_eq!(
            client.endpoint("/orders/my-orders").unwrap().as_str(),
            "https://api.example.com/api/orders/my-orders"
        );
        assert_eq!(
            client.endpoint("cakes").unwrap().as_str(),
            "https://api.example.com/api/cakes"
        );
    }

    #[test]
    fn test_require_admin() {
        let session = |role| {
            Session::new(
                SecretString::from("a"),
                SecretString::from("r"),
                UserId::new("u"),
                role,
            )
        };
        assert!(ApiClient::require_admin(&session(UserRole::Admin)).is_ok());
        assert!(matches!(
            ApiClient::require_admin(&session(UserRole::User)),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_debug_shows_base_url() {
        let debug = format!("{:?}", client());
        assert!(debug.contains("api.example.com"));
    }
}
