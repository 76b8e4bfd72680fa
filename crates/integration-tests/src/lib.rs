//! Integration tests for the catalog sync client.
//!
//! The tests run the real [`HttpCatalogClient`](catalog_client::HttpCatalogClient)
//! and store against [`MockBackend`], an in-process axum server that speaks
//! the same REST resource model as the catalog backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p catalog-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `remote_client` - HTTP client against the resource endpoints
//! - `store_sync` - store actions end to end, including rollback paths

mod backend;

pub use backend::{MockBackend, Route};

use catalog_core::{Product, ProductId, Size};

/// A product with fixed dimensions, for seeding the backend.
#[must_use]
pub fn sample_product(id: &str, name: &str, count: u32) -> Product {
    Product {
        id: ProductId::new(id),
        image_url: format!("https://cdn.example.com/{id}.png"),
        name: name.to_string(),
        count,
        size: Size {
            width: 10.0,
            height: 20.0,
        },
        weight: "200g".to_string(),
        comments: Vec::new(),
    }
}
