//! `reqwest` implementation of the catalog API.

use std::sync::Arc;

use catalog_core::{Comment, CommentId, Product, ProductId};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, CatalogApi};
use crate::config::ClientConfig;

const PRODUCTS: &str = "products";
const COMMENTS: &str = "comments";

/// Catalog REST client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpCatalogClient {
    inner: Arc<HttpCatalogClientInner>,
}

struct HttpCatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for HttpCatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpCatalogClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpCatalogClient {
    /// Create a new client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(HttpCatalogClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The backend root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

impl CatalogApi for HttpCatalogClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let response = self.inner.client.get(self.url(&[PRODUCTS])?).send().await?;
        let products: Vec<Product> = decode(response, PRODUCTS).await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url(&[PRODUCTS, id.as_str()])?)
            .send()
            .await?;
        decode(response, &format!("{PRODUCTS}/{id}")).await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn create_product(&self, product: &Product) -> Result<Product, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(&[PRODUCTS])?)
            .json(product)
            .send()
            .await?;
        decode(response, PRODUCTS).await
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn replace_product(&self, product: &Product) -> Result<Product, ApiError> {
        let response = self
            .inner
            .client
            .put(self.url(&[PRODUCTS, product.id.as_str()])?)
            .json(product)
            .send()
            .await?;
        decode(response, &format!("{PRODUCTS}/{}", product.id)).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .delete(self.url(&[PRODUCTS, id.as_str()])?)
            .send()
            .await?;
        check_status(response, &format!("{PRODUCTS}/{id}")).await?;
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn list_comments(&self, product_id: &ProductId) -> Result<Vec<Comment>, ApiError> {
        let response = self
            .inner
            .client
            .get(self.url(&[COMMENTS])?)
            .query(&[("productId", product_id.as_str())])
            .send()
            .await?;
        decode(response, COMMENTS).await
    }

    #[instrument(
        skip(self, comment),
        fields(comment_id = %comment.id, product_id = %comment.product_id)
    )]
    async fn create_comment(&self, comment: &Comment) -> Result<Comment, ApiError> {
        let response = self
            .inner
            .client
            .post(self.url(&[COMMENTS])?)
            .json(comment)
            .send()
            .await?;
        decode(response, COMMENTS).await
    }

    #[instrument(skip(self), fields(comment_id = %id))]
    async fn delete_comment(&self, id: &CommentId) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .delete(self.url(&[COMMENTS, id.as_str()])?)
            .send()
            .await?;
        check_status(response, &format!("{COMMENTS}/{id}")).await?;
        Ok(())
    }
}

/// Map non-success statuses to errors, passing successful responses through.
async fn check_status(response: Response, resource: &str) -> Result<Response, ApiError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(resource.to_string()));
    }

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response, resource: &str) -> Result<T, ApiError> {
    let response = check_status(response, resource).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| ApiError::Parse(format!("{resource}: {e}")))
}
