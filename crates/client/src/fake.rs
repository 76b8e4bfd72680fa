//! In-memory [`CatalogApi`] with scripted failures and latency.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use catalog_core::{Comment, CommentId, Product, ProductId};

use crate::api::{ApiError, CatalogApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListProducts,
    GetProduct,
    CreateProduct,
    ReplaceProduct,
    DeleteProduct,
    ListComments,
    CreateComment,
    DeleteComment,
}

#[derive(Default)]
struct State {
    products: Vec<Product>,
    comments: Vec<Comment>,
    failures: HashMap<Op, VecDeque<ApiError>>,
    delays: HashMap<Op, VecDeque<Duration>>,
    /// Completed calls in resolution order.
    resolved: Vec<(Op, String)>,
}

#[derive(Clone, Default)]
pub struct FakeApi {
    state: Arc<Mutex<State>>,
}

impl FakeApi {
    pub fn with_products(products: Vec<Product>) -> Self {
        let api = Self::default();
        api.lock().products = products;
        api
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Make the next call to `op` fail with `error`.
    pub fn fail_next(&self, op: Op, error: ApiError) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Delay the next call to `op` by `delay`.
    pub fn delay_next(&self, op: Op, delay: Duration) {
        self.lock().delays.entry(op).or_default().push_back(delay);
    }

    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    pub fn comments(&self) -> Vec<Comment> {
        self.lock().comments.clone()
    }

    pub fn resolved(&self) -> Vec<(Op, String)> {
        self.lock().resolved.clone()
    }

    pub fn set_products(&self, products: Vec<Product>) {
        self.lock().products = products;
    }

    async fn begin(&self, op: Op) -> Result<(), ApiError> {
        let delay = self.lock().delays.get_mut(&op).and_then(VecDeque::pop_front);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.lock().failures.get_mut(&op).and_then(VecDeque::pop_front);
        failure.map_or(Ok(()), Err)
    }

    fn finish(&self, op: Op, key: impl Into<String>) {
        self.lock().resolved.push((op, key.into()));
    }
}

pub fn server_error() -> ApiError {
    ApiError::Api {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}

impl CatalogApi for FakeApi {
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.begin(Op::ListProducts).await?;
        let products = self.products();
        self.finish(Op::ListProducts, "");
        Ok(products)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        self.begin(Op::GetProduct).await?;
        let found = self.lock().products.iter().find(|p| &p.id == id).cloned();
        let product = found.ok_or_else(|| ApiError::NotFound(format!("products/{id}")))?;
        self.finish(Op::GetProduct, id.as_str());
        Ok(product)
    }

    async fn create_product(&self, product: &Product) -> Result<Product, ApiError> {
        self.begin(Op::CreateProduct).await?;
        {
            let mut state = self.lock();
            if state.products.iter().any(|p| p.id == product.id) {
                return Err(server_error());
            }
            state.products.push(product.clone());
        }
        self.finish(Op::CreateProduct, product.id.as_str());
        Ok(product.clone())
    }

    async fn replace_product(&self, product: &Product) -> Result<Product, ApiError> {
        self.begin(Op::ReplaceProduct).await?;
        {
            let mut state = self.lock();
            let slot = state
                .products
                .iter_mut()
                .find(|p| p.id == product.id)
                .ok_or_else(|| ApiError::NotFound(format!("products/{}", product.id)))?;
            *slot = product.clone();
        }
        self.finish(Op::ReplaceProduct, format!("{}:{}", product.id, product.count));
        Ok(product.clone())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        self.begin(Op::DeleteProduct).await?;
        {
            let mut state = self.lock();
            let before = state.products.len();
            state.products.retain(|p| &p.id != id);
            if state.products.len() == before {
                return Err(ApiError::NotFound(format!("products/{id}")));
            }
        }
        self.finish(Op::DeleteProduct, id.as_str());
        Ok(())
    }

    async fn list_comments(&self, product_id: &ProductId) -> Result<Vec<Comment>, ApiError> {
        self.begin(Op::ListComments).await?;
        let comments: Vec<Comment> = self
            .lock()
            .comments
            .iter()
            .filter(|c| &c.product_id == product_id)
            .cloned()
            .collect();
        self.finish(Op::ListComments, product_id.as_str());
        Ok(comments)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<Comment, ApiError> {
        self.begin(Op::CreateComment).await?;
        {
            let mut state = self.lock();
            if state.comments.iter().any(|c| c.id == comment.id) {
                return Err(server_error());
            }
            state.comments.push(comment.clone());
        }
        self.finish(Op::CreateComment, comment.id.as_str());
        Ok(comment.clone())
    }

    async fn delete_comment(&self, id: &CommentId) -> Result<(), ApiError> {
        self.begin(Op::DeleteComment).await?;
        {
            let mut state = self.lock();
            let before = state.comments.len();
            state.comments.retain(|c| &c.id != id);
            if state.comments.len() == before {
                return Err(ApiError::NotFound(format!("comments/{id}")));
            }
        }
        self.finish(Op::DeleteComment, id.as_str());
        Ok(())
    }
}
