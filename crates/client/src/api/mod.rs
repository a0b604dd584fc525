//! HTTP client core for the storefront REST API.
//!
//! [`ApiClient`] owns the HTTP connection pool, the token store and the
//! catalog cache. Every backend call goes through one pipeline:
//!
//! 1. Attach `Authorization: Bearer <access token>` when a token is stored.
//! 2. Send the request.
//! 3. On `401` with a stored refresh token, exchange it once at
//!    `/auth/refresh`, persist the new pair and retry exactly once. If the
//!    exchange is rejected, the tokens are cleared, invalidation listeners
//!    fire and the call fails with [`ApiError::SessionExpired`].
//! 4. Normalize any non-2xx response into an [`ApiError`].
//!
//! Concurrent refreshes are coalesced: only one exchange runs at a time, and
//! callers that lose the race reuse the pair it produced.
//!
//! Resource operations live in submodules as further `impl ApiClient` blocks.

mod auth;
mod cache;
mod cart;
mod products;
mod reviews;

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::TokenPair;
use crate::store::{FileTokenStore, TokenStore};
use cache::CatalogCache;

/// Header carrying the per-call correlation id.
const REQUEST_ID_HEADER: &str = "x-request-id";

type InvalidationListener = Arc<dyn Fn() + Send + Sync>;

/// How a request authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthMode {
    /// Bearer token when stored; one refresh-and-retry on 401.
    Session,
    /// Bearer token when stored; a 401 is returned as-is.
    NoRefresh,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool, token store, listeners
/// and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
    cancel: Option<CancellationToken>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    store: Arc<dyn TokenStore>,
    /// Serializes refresh exchanges with sign-in and sign-out.
    session_lock: tokio::sync::Mutex<()>,
    listeners: Mutex<Vec<InvalidationListener>>,
    catalog: CatalogCache,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("cancellable", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client that persists its session to `config.state_file`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let store = Arc::new(FileTokenStore::open(&config.state_file));
        Self::with_store(config, store)
    }

    /// Create a client over an arbitrary token store.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn with_store(config: &ClientConfig, store: Arc<dyn TokenStore>) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("vitrine/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.base_url.clone(),
                store,
                session_lock: tokio::sync::Mutex::new(()),
                listeners: Mutex::new(Vec::new()),
                catalog: CatalogCache::new(config.catalog_ttl),
            }),
            cancel: None,
        })
    }

    /// A handle whose requests fail with [`ApiError::Cancelled`] once `token`
    /// is cancelled.
    ///
    /// A refresh exchange already in flight still completes in the background
    /// so a rotated token pair is never lost.
    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            cancel: Some(token),
        }
    }

    /// Register a callback fired when a failed refresh ends the session.
    ///
    /// Callbacks run synchronously, in registration order, after the tokens
    /// have been cleared.
    pub fn on_session_invalidated(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// The backend origin.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Whether a token pair is currently stored.
    #[must_use]
    pub fn has_tokens(&self) -> bool {
        self.inner.store.tokens().is_some()
    }

    pub(crate) fn store(&self) -> &dyn TokenStore {
        self.inner.store.as_ref()
    }

    /// Drop every cached catalog response.
    pub async fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate_all().await;
    }

    pub(crate) fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }

    /// Exclusive access to the stored session. Held across a whole refresh
    /// exchange, so a sign-in or sign-out never interleaves with one.
    pub(crate) async fn lock_session(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.inner.session_lock.lock().await
    }

    // =========================================================================
    // Request pipeline
    // =========================================================================

    /// Absolute URL for `segments` under the base URL, with `query` appended.
    ///
    /// Segments are percent-encoded, so ids can never escape their path slot.
    pub(crate) fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.inner.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Perform one logical request and decode the JSON response.
    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&(impl Serialize + Sync)>,
        auth: AuthMode,
    ) -> ApiResult<T> {
        let body = body.map(serde_json::to_value).transpose()?;
        self.execute(method, url, body, auth).await
    }

    #[instrument(
        skip_all,
        fields(method = %method, path = %url.path(), request_id = tracing::field::Empty)
    )]
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
        auth: AuthMode,
    ) -> ApiResult<T> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(ApiError::Cancelled);
        }

        let request_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("request_id", request_id.as_str());

        // One snapshot, so the refresh below belongs to the pair that was sent.
        let sent_with = self.inner.store.tokens();
        let mut response = self
            .send(
                &method,
                &url,
                body.as_ref(),
                sent_with.as_ref().map(TokenPair::access_token),
                &request_id,
            )
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED
            && auth == AuthMode::Session
            && let Some(tokens) = sent_with
        {
            debug!("Access token rejected, refreshing");
            let access_token = self.refresh_session(tokens.refresh_token().clone()).await?;
            response = self
                .send(&method, &url, body.as_ref(), Some(&access_token), &request_id)
                .await?;
        }

        self.decode(response).await
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&serde_json::Value>,
        access_token: Option<&SecretString>,
        request_id: &str,
    ) -> ApiResult<Response> {
        let mut request = self
            .inner
            .http
            .request(method.clone(), url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(REQUEST_ID_HEADER, request_id);

        if let Some(token) = access_token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = self.cancellable(request.send()).await??;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> ApiResult<T> {
        let status = response.status();
        let bytes = self.cancellable(response.bytes()).await??;

        if !status.is_success() {
            let err = ApiError::from_response(status, &String::from_utf8_lossy(&bytes));
            debug!(status = %status, error = %err, "Request failed");
            return Err(err);
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn cancellable<F: Future>(&self, future: F) -> ApiResult<F::Output> {
        match &self.cancel {
            Some(token) => token
                .run_until_cancelled(future)
                .await
                .ok_or(ApiError::Cancelled),
            None => Ok(future.await),
        }
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Obtain a fresh access token after `stale` was answered with 401.
    ///
    /// The exchange runs on its own task so that dropping or cancelling the
    /// caller never abandons a half-finished rotation.
    async fn refresh_session(&self, stale: SecretString) -> ApiResult<SecretString> {
        let client = Self {
            inner: Arc::clone(&self.inner),
            cancel: None,
        };
        let task = tokio::spawn(async move { client.refresh_exclusive(stale).await });

        match self.cancellable(task).await? {
            Ok(result) => result,
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Err(_) => Err(ApiError::Cancelled),
        }
    }

    #[instrument(skip_all)]
    async fn refresh_exclusive(&self, stale: SecretString) -> ApiResult<SecretString> {
        let _guard = self.inner.session_lock.lock().await;

        match self.inner.store.tokens() {
            None => {
                debug!("Session ended while waiting to refresh");
                return Err(ApiError::SessionExpired);
            }
            Some(current) if !current.has_refresh_token(&stale) => {
                debug!("Token pair already rotated by a concurrent refresh");
                return Ok(current.access_token().clone());
            }
            Some(_) => {}
        }

        // Writes below only land while the store still holds `stale`.
        match self.exchange_refresh_token(&stale).await {
            Ok(tokens) => {
                if self.inner.store.replace_tokens_if(&stale, Some(&tokens))? {
                    info!("Token pair rotated");
                    Ok(tokens.access_token().clone())
                } else {
                    debug!("Session replaced during refresh, discarding rotated pair");
                    Err(ApiError::SessionExpired)
                }
            }
            // The server was never reached; the pair may still be valid.
            Err(e @ ApiError::Network(_)) => Err(e),
            Err(e) => {
                warn!(error = %e, "Token refresh rejected, ending session");
                match self.inner.store.replace_tokens_if(&stale, None) {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!("Session replaced during refresh, leaving it in place");
                        return Err(ApiError::SessionExpired);
                    }
                    Err(e) => warn!(error = %e, "Failed to clear session storage"),
                }
                self.notify_session_invalidated();
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// `POST /auth/refresh`. Sent without a bearer token and never retried.
    async fn exchange_refresh_token(&self, refresh_token: &SecretString) -> ApiResult<TokenPair> {
        let url = self.endpoint(&["auth", "refresh"], &[]);
        let body = json!({ "refreshToken": refresh_token.expose_secret() });
        let request_id = Uuid::new_v4().to_string();

        let response = self
            .send(&Method::POST, &url, Some(&body), None, &request_id)
            .await?;
        self.decode(response).await
    }

    fn notify_session_invalidated(&self) {
        let listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::store::MemoryTokenStore;

    fn client(base: &str) -> ApiClient {
        let config = ClientConfig::new(base).unwrap();
        ApiClient::with_store(&config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let client = client("http://localhost:3000");
        let url = client.endpoint(&["products", "a/b c"], &[("sort", "price_asc")]);
        assert_eq!(
            url.as_str(),
            "http://localhost:3000/products/a%2Fb%20c?sort=price_asc"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = client("https://api.loja.example/v1/");
        let url = client.endpoint(&["cart"], &[]);
        assert_eq!(url.as_str(), "https://api.loja.example/v1/cart");
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let client = client("http://localhost:3000");
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            client.on_session_invalidated(move || order.lock().unwrap().push(n));
        }

        client.notify_session_invalidated();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_listeners_shared_between_clones() {
        let client = client("http://localhost:3000");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        client.on_session_invalidated(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client
            .with_cancellation(CancellationToken::new())
            .notify_session_invalidated();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_send() {
        let token = CancellationToken::new();
        token.cancel();
        let client = client("http://localhost:3000").with_cancellation(token);

        let url = client.endpoint(&["categories"], &[]);
        let result = client
            .request::<serde_json::Value>(Method::GET, url, None::<&()>, AuthMode::Session)
            .await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }
}
