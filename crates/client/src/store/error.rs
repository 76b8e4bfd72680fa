//! Store-level errors.

use catalog_core::ProductId;
use thiserror::Error;

use crate::api::ApiError;
use crate::saga::SagaError;

/// Errors returned by store actions.
///
/// Apart from [`SyncError::Closed`] and failed comment reads, the error has
/// also been recorded in the store's status by the time the caller sees it.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A single backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The backend accepted a replace for a product the store no longer holds.
    #[error("Product {0} is no longer in the local list")]
    MissingLocally(ProductId),

    /// A multi-step operation failed part-way.
    #[error(transparent)]
    Saga(#[from] SagaError),

    /// The store task has stopped.
    #[error("Catalog store is not running")]
    Closed,
}

impl SyncError {
    /// The underlying backend error, if any.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            Self::Saga(e) => Some(&e.source),
            Self::MissingLocally(_) | Self::Closed => None,
        }
    }
}
