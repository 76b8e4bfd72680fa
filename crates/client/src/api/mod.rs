//! Remote resource client for the catalog backend.
//!
//! Translates domain operations into requests against two independent REST
//! collections and decodes the JSON responses.
//!
//! # Resources
//!
//! - `GET /products`, `POST /products`
//! - `GET /products/{id}`, `PUT /products/{id}`, `DELETE /products/{id}`
//! - `GET /comments?productId={id}`, `POST /comments`, `DELETE /comments/{id}`
//!
//! # Architecture
//!
//! - [`CatalogApi`] is the seam the store depends on
//! - [`HttpCatalogClient`] implements it with `reqwest`
//! - Each call is a single request: no retries, no caching

mod client;

pub use client::HttpCatalogClient;

use std::future::Future;

use catalog_core::{Comment, CommentId, Product, ProductId};
use thiserror::Error;

/// Errors that can occur when talking to the catalog backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status other than 404.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A request URL could not be built from the configured base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Transport failure or unexpected status.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Api { .. })
    }

    /// The addressed resource does not exist remotely.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Operations against the `products` and `comments` collections.
///
/// Implementations are shared with the store's actor task, so every
/// returned future must be `Send`.
pub trait CatalogApi: Send + Sync + 'static {
    /// Fetch every product in server order.
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, ApiError>> + Send;

    /// Fetch a single product.
    fn get_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Store a new product; returns the stored representation.
    fn create_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Replace a product wholesale; returns the stored representation.
    fn replace_product(
        &self,
        product: &Product,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Delete a product. Deleting an absent id yields `NotFound`.
    fn delete_product(&self, id: &ProductId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Fetch the comments attached to a product.
    fn list_comments(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<Vec<Comment>, ApiError>> + Send;

    /// Store a new comment; returns the stored representation.
    fn create_comment(
        &self,
        comment: &Comment,
    ) -> impl Future<Output = Result<Comment, ApiError>> + Send;

    /// Delete a comment.
    fn delete_comment(&self, id: &CommentId) -> impl Future<Output = Result<(), ApiError>> + Send;
}
