//! Catalog client library.
//!
//! Keeps an in-memory product list consistent with a remote REST backend.
//!
//! # Architecture
//!
//! - [`api`] - Remote resource client over the `products` and `comments`
//!   collections (`reqwest`, one request per call, no retries)
//! - [`store`] - Synchronization store: a single actor task owning the
//!   product list, processing mutations strictly in submission order
//! - [`saga`] - Step sequences with compensations, used for the two-write
//!   comment operations
//! - [`config`] - Environment-driven configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use catalog_client::{ClientConfig, HttpCatalogClient, CatalogStore};
//!
//! let config = ClientConfig::from_env()?;
//! let api = HttpCatalogClient::new(&config)?;
//! let store = CatalogStore::spawn(api, config.store_options());
//!
//! store.load().await?;
//! let snapshot = store.snapshot();
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod saga;
pub mod store;

#[cfg(test)]
pub(crate) mod fake;

pub use api::{ApiError, CatalogApi, HttpCatalogClient};
pub use config::{ClientConfig, ConfigError, parse_base_url};
pub use saga::{Saga, SagaError};
pub use store::{CatalogStore, StoreHandle, StoreOptions, SyncError};
