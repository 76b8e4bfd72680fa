//! Core types for the product catalog.
//!
//! This module provides type-safe wrappers for the catalog's domain concepts.

pub mod comment;
pub mod id;
pub mod product;
pub mod status;
pub mod validation;

pub use comment::{Comment, CommentDraft};
pub use id::*;
pub use product::{Product, ProductDraft, ProductSortKey, Size, sort_products};
pub use status::{Snapshot, StoreStatus};
pub use validation::ValidationError;
