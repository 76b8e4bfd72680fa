//! In-process catalog backend.
//!
//! Serves `/products` and `/comments` from memory. Individual routes can be
//! scripted to fail or stall, and every handled request is logged in
//! completion order.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use catalog_client::{
    ApiError, CatalogStore, ClientConfig, HttpCatalogClient, StoreHandle, StoreOptions,
};
use catalog_core::{Comment, CommentId, Product, ProductId};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use url::Url;

/// Backend endpoints, for scripting failures and latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    ListProducts,
    GetProduct,
    CreateProduct,
    ReplaceProduct,
    DeleteProduct,
    ListComments,
    CreateComment,
    DeleteComment,
}

impl Route {
    fn classify(method: &Method, path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        let route = match (method.as_str(), segments.as_slice()) {
            ("GET", ["products"]) => Self::ListProducts,
            ("GET", ["products", _]) => Self::GetProduct,
            ("POST", ["products"]) => Self::CreateProduct,
            ("PUT", ["products", _]) => Self::ReplaceProduct,
            ("DELETE", ["products", _]) => Self::DeleteProduct,
            ("GET", ["comments"]) => Self::ListComments,
            ("POST", ["comments"]) => Self::CreateComment,
            ("DELETE", ["comments", _]) => Self::DeleteComment,
            _ => return None,
        };
        Some(route)
    }
}

#[derive(Default)]
struct Data {
    products: Vec<Product>,
    comments: Vec<Comment>,
    faults: HashMap<Route, VecDeque<StatusCode>>,
    delays: HashMap<Route, VecDeque<Duration>>,
    requests: Vec<String>,
}

#[derive(Clone, Default)]
struct MockState {
    inner: Arc<Mutex<Data>>,
}

impl MockState {
    fn lock(&self) -> MutexGuard<'_, Data> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A running mock backend bound to an ephemeral local port.
///
/// The server stops when the value is dropped.
pub struct MockBackend {
    base_url: Url,
    state: MockState,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl MockBackend {
    /// Start an empty backend.
    ///
    /// # Errors
    ///
    /// Returns error if no local port can be bound.
    pub async fn spawn() -> io::Result<Self> {
        Self::with_products(Vec::new()).await
    }

    /// Start a backend holding `products`.
    ///
    /// # Errors
    ///
    /// Returns error if no local port can be bound.
    pub async fn with_products(products: Vec<Product>) -> io::Result<Self> {
        let state = MockState::default();
        state.lock().products = products;

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}/")).map_err(io::Error::other)?;

        let app = router(state.clone());
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Ok(Self {
            base_url,
            state,
            task,
        })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(5),
            ..ClientConfig::new(self.base_url.clone())
        }
    }

    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn client(&self) -> Result<HttpCatalogClient, ApiError> {
        HttpCatalogClient::new(&self.config())
    }

    /// Spawn a store talking to this backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn store(&self, options: StoreOptions) -> Result<StoreHandle, ApiError> {
        Ok(CatalogStore::spawn(self.client()?, options))
    }

    /// Answer the next request to `route` with `status` and no side effect.
    pub fn fail_next(&self, route: Route, status: StatusCode) {
        self.state
            .lock()
            .faults
            .entry(route)
            .or_default()
            .push_back(status);
    }

    /// Hold the next request to `route` for `delay` before handling it.
    pub fn delay_next(&self, route: Route, delay: Duration) {
        self.state
            .lock()
            .delays
            .entry(route)
            .or_default()
            .push_back(delay);
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.state.lock().products.clone()
    }

    #[must_use]
    pub fn comments(&self) -> Vec<Comment> {
        self.state.lock().comments.clone()
    }

    /// Replace the product collection behind the client's back.
    pub fn set_products(&self, products: Vec<Product>) {
        self.state.lock().products = products;
    }

    /// Handled requests as `METHOD /path STATUS`, in completion order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(replace_product).delete(delete_product),
        )
        .route("/comments", get(list_comments).post(create_comment))
        .route("/comments/{id}", delete(delete_comment))
        .layer(middleware::from_fn_with_state(state.clone(), script))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Apply scripted latency and failures, then record the outcome.
async fn script(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let label = format!("{} {}", request.method(), request.uri().path());

    if let Some(route) = Route::classify(request.method(), request.uri().path()) {
        let delay = state.lock().delays.get_mut(&route).and_then(VecDeque::pop_front);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let fault = state.lock().faults.get_mut(&route).and_then(VecDeque::pop_front);
        if let Some(status) = fault {
            state.lock().requests.push(format!("{label} {}", status.as_u16()));
            return (status, "injected failure").into_response();
        }
    }

    let response = next.run(request).await;
    state
        .lock()
        .requests
        .push(format!("{label} {}", response.status().as_u16()));
    response
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(State(state): State<MockState>) -> Json<Vec<Product>> {
    Json(state.lock().products.clone())
}

async fn get_product(
    State(state): State<MockState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, StatusCode> {
    state
        .lock()
        .products
        .iter()
        .find(|p| p.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_product(
    State(state): State<MockState>,
    Json(product): Json<Product>,
) -> Result<(StatusCode, Json<Product>), StatusCode> {
    let mut data = state.lock();
    if data.products.iter().any(|p| p.id == product.id) {
        return Err(StatusCode::CONFLICT);
    }
    data.products.push(product.clone());
    Ok((StatusCode::CREATED, Json(product)))
}

async fn replace_product(
    State(state): State<MockState>,
    Path(id): Path<ProductId>,
    Json(mut product): Json<Product>,
) -> Result<Json<Product>, StatusCode> {
    product.id = id;
    let mut data = state.lock();
    let slot = data
        .products
        .iter_mut()
        .find(|p| p.id == product.id)
        .ok_or(StatusCode::NOT_FOUND)?;
    slot.clone_from(&product);
    Ok(Json(product))
}

async fn delete_product(State(state): State<MockState>, Path(id): Path<ProductId>) -> StatusCode {
    let mut data = state.lock();
    let before = data.products.len();
    data.products.retain(|p| p.id != id);
    if data.products.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentFilter {
    product_id: Option<ProductId>,
}

async fn list_comments(
    State(state): State<MockState>,
    Query(filter): Query<CommentFilter>,
) -> Json<Vec<Comment>> {
    let comments: Vec<Comment> = state
        .lock()
        .comments
        .iter()
        .filter(|c| filter.product_id.as_ref().is_none_or(|id| &c.product_id == id))
        .cloned()
        .collect();
    Json(comments)
}

async fn create_comment(
    State(state): State<MockState>,
    Json(comment): Json<Comment>,
) -> Result<(StatusCode, Json<Comment>), StatusCode> {
    let mut data = state.lock();
    if data.comments.iter().any(|c| c.id == comment.id) {
        return Err(StatusCode::CONFLICT);
    }
    data.comments.push(comment.clone());
    Ok((StatusCode::CREATED, Json(comment)))
}

async fn delete_comment(State(state): State<MockState>, Path(id): Path<CommentId>) -> StatusCode {
    let mut data = state.lock();
    let before = data.comments.len();
    data.comments.retain(|c| c.id != id);
    if data.comments.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}
