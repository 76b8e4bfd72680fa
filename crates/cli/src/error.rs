//! CLI errors.

use catalog_client::{ApiError, ConfigError, SyncError};
use catalog_core::{ProductId, ValidationError};
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP client setup failed.
    #[error("Could not create HTTP client: {0}")]
    Client(#[from] ApiError),

    /// A store action failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Form input was rejected.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The product is not in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// An update was requested without any field to change.
    #[error("Nothing to update; pass at least one field")]
    NoChanges,

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}
