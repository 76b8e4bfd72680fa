//! Command implementations.
//!
//! Every command talks to the backend through a [`StoreHandle`] and writes
//! its output to the writer it is given. Input is validated here, before
//! anything reaches the store.

use catalog_client::{CatalogStore, ClientConfig, HttpCatalogClient, StoreHandle};
use catalog_core::{ProductDraft, Size};
use clap::Args;

use crate::error::CliError;

pub mod comment;
pub mod product;

/// Start a store against the configured backend.
pub fn connect(config: &ClientConfig) -> Result<StoreHandle, CliError> {
    let client = HttpCatalogClient::new(config)?;
    tracing::debug!(base_url = %client.base_url(), "Connecting to catalog backend");
    Ok(CatalogStore::spawn(client, config.store_options()))
}

/// Fields of a new product.
#[derive(Debug, Args)]
pub struct ProductArgs {
    /// Display name
    #[arg(long)]
    pub name: String,

    /// Units in stock
    #[arg(long)]
    pub count: u32,

    /// Image location
    #[arg(long)]
    pub image_url: String,

    /// Weight with unit, e.g. `450g`
    #[arg(long)]
    pub weight: String,

    /// Width, greater than zero
    #[arg(long)]
    pub width: f64,

    /// Height, greater than zero
    #[arg(long)]
    pub height: f64,
}

impl From<ProductArgs> for ProductDraft {
    fn from(args: ProductArgs) -> Self {
        Self {
            image_url: args.image_url,
            name: args.name,
            count: args.count,
            size: Size {
                width: args.width,
                height: args.height,
            },
            weight: args.weight,
        }
    }
}

/// Changes to an existing product.
#[derive(Debug, Default, Args)]
pub struct ProductEdits {
    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New stock count
    #[arg(long)]
    pub count: Option<u32>,

    /// New image location
    #[arg(long)]
    pub image_url: Option<String>,

    /// New weight
    #[arg(long)]
    pub weight: Option<String>,

    /// New width
    #[arg(long)]
    pub width: Option<f64>,

    /// New height
    #[arg(long)]
    pub height: Option<f64>,
}

impl ProductEdits {
    /// Apply the given changes on top of `draft`.
    #[must_use]
    pub fn apply_to(self, mut draft: ProductDraft) -> ProductDraft {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(count) = self.count {
            draft.count = count;
        }
        if let Some(image_url) = self.image_url {
            draft.image_url = image_url;
        }
        if let Some(weight) = self.weight {
            draft.weight = weight;
        }
        if let Some(width) = self.width {
            draft.size.width = width;
        }
        if let Some(height) = self.height {
            draft.size.height = height;
        }
        draft
    }

    /// Whether no field was given.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.count.is_none()
            && self.image_url.is_none()
            && self.weight.is_none()
            && self.width.is_none()
            && self.height.is_none()
    }
}

/// A new comment.
#[derive(Debug, Args)]
pub struct CommentArgs {
    /// Product id
    pub product_id: String,

    /// Comment text
    pub description: String,
}
