//! End-to-end test support for the Vitrine client.
//!
//! [`MockBackend`] is an in-process implementation of the storefront REST
//! API, served by `axum` on `127.0.0.1` with an OS-assigned port. It keeps
//! users, tokens, carts and reviews in memory, records every request it
//! receives, and exposes knobs to expire access tokens, reject refresh
//! tokens, slow down refreshes and inject one-off failures.
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! let client = backend.client();
//! let products = client.list_products(None, None).await?;
//! assert_eq!(backend.count("GET", "/products"), 1);
//! ```
//!
//! Seeded catalog:
//!
//! | id | title    | price  | category    |
//! |----|----------|--------|-------------|
//! | p1 | Camiseta | 49.90  | c1 (Roupas) |
//! | p2 | Caneca   | 20.00  | c2 (Casa)   |
//! | p3 | Moletom  | 129.90 | c1 (Roupas) |

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use uuid::Uuid;
use vitrine_client::{ApiClient, ClientConfig, MemoryTokenStore, TokenPair, TokenStore};

/// One request as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Path without the query string.
    pub path: String,
    pub query: Option<String>,
    /// Raw `Authorization` header value.
    pub authorization: Option<String>,
    /// Raw `x-request-id` header value.
    pub request_id: Option<String>,
}

#[derive(Debug, Clone)]
struct MockUser {
    id: String,
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct MockProduct {
    id: &'static str,
    title: &'static str,
    price: f64,
    category_id: &'static str,
    sizes: &'static [&'static str],
}

#[derive(Debug, Clone)]
struct MockReview {
    id: String,
    user_id: String,
    rating: u8,
    comment: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Failure {
    method: String,
    path: String,
    status: StatusCode,
    body: Value,
}

#[derive(Debug, Default)]
struct BackendState {
    users: Vec<MockUser>,
    /// access token -> user id
    access_tokens: HashMap<String, String>,
    /// refresh token -> user id
    refresh_tokens: HashMap<String, String>,
    /// user id -> (product id, quantity), in insertion order
    carts: HashMap<String, Vec<(String, u32)>>,
    /// product id -> reviews
    reviews: HashMap<String, Vec<MockReview>>,
    categories: Vec<(&'static str, &'static str)>,
    products: Vec<MockProduct>,
    requests: Vec<RecordedRequest>,
    reject_refresh: bool,
    refresh_delay: Option<Duration>,
    failures: Vec<Failure>,
}

type Shared = Arc<Mutex<BackendState>>;

/// In-process storefront backend.
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockBackend {
    /// Start a backend with the seeded catalog and no users.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            categories: vec![("c1", "Roupas"), ("c2", "Casa")],
            products: vec![
                MockProduct {
                    id: "p1",
                    title: "Camiseta",
                    price: 49.9,
                    category_id: "c1",
                    sizes: &["P", "M", "G"],
                },
                MockProduct {
                    id: "p2",
                    title: "Caneca",
                    price: 20.0,
                    category_id: "c2",
                    sizes: &[],
                },
                MockProduct {
                    id: "p3",
                    title: "Moletom",
                    price: 129.9,
                    category_id: "c1",
                    sizes: &["M", "G"],
                },
            ],
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .route("/auth/refresh", post(refresh))
            .route("/auth/logout", post(logout))
            .route("/products", get(list_products))
            .route("/products/{id}", get(get_product))
            .route("/products/category/{id}", get(list_products_by_category))
            .route("/categories", get(list_categories))
            .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
            .route(
                "/cart/{product_id}",
                patch(update_cart_item).delete(remove_from_cart),
            )
            .route(
                "/reviews/{product_id}",
                get(list_reviews).post(submit_review).delete(delete_review),
            )
            .layer(middleware::from_fn_with_state(state.clone(), record_request))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend failed");
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL of the backend, e.g. `http://127.0.0.1:41234`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend, with the catalog cache
    /// disabled so request counts are exact.
    ///
    /// # Panics
    ///
    /// Panics if the URL is rejected (it never is).
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.url())
            .expect("Mock backend URL is valid")
            .without_catalog_cache()
    }

    /// Client over an empty in-memory token store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        self.client_with_store(Arc::new(MemoryTokenStore::new()))
    }

    /// Client over `store`.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client_with_store(&self, store: Arc<dyn TokenStore>) -> ApiClient {
        ApiClient::with_store(&self.config(), store).expect("Failed to build client")
    }

    /// Create an account directly, without going through the API.
    pub fn add_user(&self, name: &str, email: &str, password: &str) -> String {
        let mut state = self.lock();
        let id = format!("u{}", state.users.len() + 1);
        state.users.push(MockUser {
            id: id.clone(),
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        });
        id
    }

    /// Mint a valid token pair for an existing user.
    ///
    /// # Panics
    ///
    /// Panics if no user has this email.
    #[must_use]
    pub fn issue_tokens(&self, email: &str) -> TokenPair {
        let mut state = self.lock();
        let user_id = state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id.clone())
            .expect("No such user");
        let (access, refresh) = state.issue(&user_id);
        TokenPair::new(access, refresh)
    }

    /// Make every access token issued so far invalid.
    pub fn expire_access_tokens(&self) {
        self.lock().access_tokens.clear();
    }

    /// Answer every refresh with 401 from now on.
    pub fn reject_refresh_tokens(&self) {
        self.lock().reject_refresh = true;
    }

    /// Delay refresh responses, to widen race windows.
    pub fn set_refresh_delay(&self, delay: Duration) {
        self.lock().refresh_delay = Some(delay);
    }

    /// Answer the next `method path` request with `status` and
    /// `{"error": message}` instead of handling it.
    pub fn fail_next(&self, method: &str, path: &str, status: StatusCode, message: &str) {
        self.lock().failures.push(Failure {
            method: method.to_owned(),
            path: path.to_owned(),
            status,
            body: json!({ "error": message }),
        });
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received for `method path`.
    #[must_use]
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Forget recorded requests.
    pub fn reset_requests(&self) {
        self.lock().requests.clear();
    }

    /// Server-side cart of a user as `(product id, quantity)` pairs.
    #[must_use]
    pub fn cart_of(&self, user_id: &str) -> Vec<(String, u32)> {
        self.lock().carts.get(user_id).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().expect("Mock backend state poisoned")
    }
}

// =============================================================================
// State helpers
// =============================================================================

impl BackendState {
    fn issue(&mut self, user_id: &str) -> (String, String) {
        let access = format!("access-{}", Uuid::new_v4());
        let refresh = format!("refresh-{}", Uuid::new_v4());
        self.access_tokens.insert(access.clone(), user_id.to_owned());
        self.refresh_tokens.insert(refresh.clone(), user_id.to_owned());
        (access, refresh)
    }

    fn user_json(&self, user_id: &str) -> Value {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map_or(Value::Null, |u| {
                json!({ "_id": u.id, "name": u.name, "email": u.email })
            })
    }

    fn auth_response(&mut self, user_id: &str) -> Value {
        let (access, refresh) = self.issue(user_id);
        json!({
            "accessToken": access,
            "refreshToken": refresh,
            "user": self.user_json(user_id),
        })
    }

    fn product(&self, id: &str) -> Option<&MockProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    fn product_json(&self, product: &MockProduct) -> Value {
        let reviews = self.reviews.get(product.id).map_or(&[][..], Vec::as_slice);
        let total = u32::try_from(reviews.len()).unwrap_or(u32::MAX);
        let avg = if total == 0 {
            0.0
        } else {
            f64::from(reviews.iter().map(|r| u32::from(r.rating)).sum::<u32>()) / f64::from(total)
        };
        let category = self
            .categories
            .iter()
            .find(|(id, _)| *id == product.category_id)
            .map_or(Value::Null, |(id, name)| json!({ "_id": id, "name": name }));

        json!({
            "_id": product.id,
            "title": product.title,
            "description": format!("{} de algodão", product.title),
            "price": product.price,
            "imageUrl": format!("https://cdn.vitrine.test/{}.png", product.id),
            "category": category,
            "rating": { "avg": avg, "total": total },
            "sizes": product.sizes,
        })
    }

    fn cart_json(&self, user_id: &str) -> Value {
        let lines = self.carts.get(user_id).map_or(&[][..], Vec::as_slice);
        Value::Array(
            lines
                .iter()
                .map(|(product_id, quantity)| {
                    let snapshot = self.product(product_id).map_or(Value::Null, |p| {
                        json!({
                            "title": p.title,
                            "price": p.price,
                            "imageUrl": format!("https://cdn.vitrine.test/{}.png", p.id),
                        })
                    });
                    json!({ "productId": product_id, "quantity": quantity, "product": snapshot })
                })
                .collect(),
        )
    }

    fn take_failure(&mut self, method: &str, path: &str) -> Option<Failure> {
        let index = self
            .failures
            .iter()
            .position(|f| f.method == method && f.path == path)?;
        Some(self.failures.remove(index))
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().expect("Mock backend state poisoned")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// The user owning the bearer token, or a 401 response.
fn authenticate(state: &BackendState, headers: &HeaderMap) -> Result<String, Response> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| state.access_tokens.get(token).cloned())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "Token inválido ou expirado"))
}

// =============================================================================
// Middleware
// =============================================================================

async fn record_request(State(state): State<Shared>, request: Request, next: Next) -> Response {
    // Recorded before the await; the request itself is moved into `next`.
    let failure = record(&state, &request);
    match failure {
        Some(failure) => (failure.status, Json(failure.body)).into_response(),
        None => next.run(request).await,
    }
}

/// Log `request` and take the failure queued for it, if any.
fn record(state: &Shared, request: &Request) -> Option<Failure> {
    let header_value = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_owned(),
        query: request.uri().query().map(str::to_owned),
        authorization: header_value(header::AUTHORIZATION.as_str()),
        request_id: header_value("x-request-id"),
    };

    let mut state = lock(state);
    let failure = state.take_failure(&recorded.method, &recorded.path);
    state.requests.push(recorded);
    failure
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: String,
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    let mut state = lock(&state);
    if body.name.trim().is_empty() || body.password.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Dados inválidos");
    }
    if state.users.iter().any(|u| u.email == body.email) {
        return error(StatusCode::CONFLICT, "Email já cadastrado");
    }

    let id = format!("u{}", state.users.len() + 1);
    state.users.push(MockUser {
        id: id.clone(),
        name: body.name,
        email: body.email,
        password: body.password,
    });
    (StatusCode::CREATED, Json(state.auth_response(&id))).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut state = lock(&state);
    let user_id = state
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .map(|u| u.id.clone());

    match user_id {
        Some(id) => Json(state.auth_response(&id)).into_response(),
        None => error(StatusCode::UNAUTHORIZED, "Credenciais inválidas"),
    }
}

async fn refresh(State(state): State<Shared>, Json(body): Json<RefreshBody>) -> Response {
    let delay = lock(&state).refresh_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut state = lock(&state);
    if state.reject_refresh {
        return error(StatusCode::UNAUTHORIZED, "Refresh token inválido");
    }
    let Some(user_id) = state.refresh_tokens.remove(&body.refresh_token) else {
        return error(StatusCode::UNAUTHORIZED, "Refresh token inválido");
    };

    let (access, refresh) = state.issue(&user_id);
    Json(json!({ "accessToken": access, "refreshToken": refresh })).into_response()
}

async fn logout(State(state): State<Shared>, Json(body): Json<RefreshBody>) -> StatusCode {
    lock(&state).refresh_tokens.remove(&body.refresh_token);
    StatusCode::NO_CONTENT
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Deserialize)]
struct ListQuery {
    search: Option<String>,
    sort: Option<String>,
}

fn sorted(state: &BackendState, mut products: Vec<&MockProduct>, sort: Option<&str>) -> Value {
    match sort {
        Some("price_asc") => products.sort_by(|a, b| a.price.total_cmp(&b.price)),
        Some("price_desc") => products.sort_by(|a, b| b.price.total_cmp(&a.price)),
        Some("title_asc") => products.sort_by(|a, b| a.title.cmp(b.title)),
        Some("title_desc") => products.sort_by(|a, b| b.title.cmp(a.title)),
        _ => {}
    }
    Value::Array(products.into_iter().map(|p| state.product_json(p)).collect())
}

async fn list_products(State(state): State<Shared>, Query(query): Query<ListQuery>) -> Json<Value> {
    let state = lock(&state);
    let needle = query.search.as_deref().map(str::to_lowercase);
    let products = state
        .products
        .iter()
        .filter(|p| {
            needle
                .as_deref()
                .is_none_or(|n| p.title.to_lowercase().contains(n))
        })
        .collect();
    Json(sorted(&state, products, query.sort.as_deref()))
}

async fn list_products_by_category(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Json<Value> {
    let state = lock(&state);
    let products = state
        .products
        .iter()
        .filter(|p| p.category_id == id)
        .collect();
    Json(sorted(&state, products, query.sort.as_deref()))
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = lock(&state);
    match state.product(&id) {
        Some(product) => Json(state.product_json(product)).into_response(),
        None => error(StatusCode::NOT_FOUND, "Produto não encontrado"),
    }
}

async fn list_categories(State(state): State<Shared>) -> Json<Value> {
    let state = lock(&state);
    Json(Value::Array(
        state
            .categories
            .iter()
            .map(|(id, name)| json!({ "_id": id, "name": name }))
            .collect(),
    ))
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemBody {
    product_id: String,
    quantity: Option<u32>,
}

#[derive(Deserialize)]
struct UpdateItemBody {
    quantity: u32,
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    match authenticate(&state, &headers) {
        Ok(user_id) => Json(state.cart_json(&user_id)).into_response(),
        Err(response) => response,
    }
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<AddItemBody>,
) -> Response {
    let mut state = lock(&state);
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let quantity = body.quantity.unwrap_or(1);
    if quantity < 1 {
        return error(StatusCode::BAD_REQUEST, "Quantidade inválida");
    }
    if state.product(&body.product_id).is_none() {
        return error(StatusCode::NOT_FOUND, "Produto não encontrado");
    }

    let lines = state.carts.entry(user_id.clone()).or_default();
    match lines.iter_mut().find(|(id, _)| *id == body.product_id) {
        Some((_, existing)) => *existing += quantity,
        None => lines.push((body.product_id, quantity)),
    }
    Json(state.cart_json(&user_id)).into_response()
}

async fn update_cart_item(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(body): Json<UpdateItemBody>,
) -> Response {
    let mut state = lock(&state);
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    if body.quantity < 1 {
        return error(StatusCode::BAD_REQUEST, "Quantidade inválida");
    }

    let line = state
        .carts
        .entry(user_id.clone())
        .or_default()
        .iter_mut()
        .find(|(id, _)| *id == product_id);
    match line {
        Some((_, quantity)) => *quantity = body.quantity,
        None => return error(StatusCode::NOT_FOUND, "Item não está no carrinho"),
    }
    Json(state.cart_json(&user_id)).into_response()
}

async fn remove_from_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    state
        .carts
        .entry(user_id.clone())
        .or_default()
        .retain(|(id, _)| *id != product_id);
    Json(state.cart_json(&user_id)).into_response()
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    state.carts.remove(&user_id);
    Json(json!({ "message": "Carrinho limpo" })).into_response()
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Deserialize)]
struct ReviewBody {
    rating: i64,
    comment: Option<String>,
}

async fn list_reviews(State(state): State<Shared>, Path(product_id): Path<String>) -> Json<Value> {
    let state = lock(&state);
    let reviews = state.reviews.get(&product_id).map_or(&[][..], Vec::as_slice);
    Json(Value::Array(
        reviews
            .iter()
            .map(|r| {
                let author = state
                    .users
                    .iter()
                    .find(|u| u.id == r.user_id)
                    .map_or(Value::Null, |u| json!({ "_id": u.id, "name": u.name }));
                json!({
                    "_id": r.id,
                    "rating": r.rating,
                    "comment": r.comment,
                    "user": author,
                    "createdAt": r.created_at.to_rfc3339(),
                })
            })
            .collect(),
    ))
}

async fn submit_review(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(body): Json<ReviewBody>,
) -> Response {
    let mut state = lock(&state);
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let Ok(rating) = u8::try_from(body.rating) else {
        return error(StatusCode::BAD_REQUEST, "Nota deve ser entre 1 e 5");
    };
    if !(1..=5).contains(&rating) {
        return error(StatusCode::BAD_REQUEST, "Nota deve ser entre 1 e 5");
    }
    if state.product(&product_id).is_none() {
        return error(StatusCode::NOT_FOUND, "Produto não encontrado");
    }

    let reviews = state.reviews.entry(product_id.clone()).or_default();
    reviews.retain(|r| r.user_id != user_id);
    reviews.push(MockReview {
        id: format!("r-{}", Uuid::new_v4()),
        user_id,
        rating,
        comment: body.comment,
        created_at: Utc::now(),
    });

    let product = state
        .product(&product_id)
        .map_or(Value::Null, |p| state.product_json(p));
    (StatusCode::CREATED, Json(product)).into_response()
}

async fn delete_review(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    let user_id = match authenticate(&state, &headers) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    if let Some(reviews) = state.reviews.get_mut(&product_id) {
        reviews.retain(|r| r.user_id != user_id);
    }
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn request(path: &str) -> Request {
        axum::http::Request::builder()
            .method("GET")
            .uri(path)
            .header(header::AUTHORIZATION, "Bearer a1")
            .body(Body::empty())
            .expect("valid request")
    }

    #[test]
    fn test_record_logs_and_takes_failure_once() {
        let state: Shared = Arc::default();
        lock(&state).failures.push(Failure {
            method: "GET".to_owned(),
            path: "/cart".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": "Falha interna" }),
        });

        let first = record(&state, &request("/cart?page=2"));
        let second = record(&state, &request("/cart"));

        assert_eq!(first.map(|f| f.status), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(second.is_none());
        let requests = lock(&state).requests.clone();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/cart");
        assert_eq!(requests[0].query.as_deref(), Some("page=2"));
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer a1"));
        assert_eq!(requests[1].query, None);
    }
}
