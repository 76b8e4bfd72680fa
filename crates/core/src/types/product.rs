//! Product domain types.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::id::{CommentId, ProductId};

// =============================================================================
// Product Types
// =============================================================================

/// Physical dimensions of a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width, strictly positive.
    pub width: f64,
    /// Height, strictly positive.
    pub height: f64,
}

/// A product as stored by the backend.
///
/// `comments` holds ids only; comment bodies live in their own collection
/// and are linked by `Comment::product_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Client-minted identity.
    pub id: ProductId,
    /// Image location.
    pub image_url: String,
    /// Display name.
    pub name: String,
    /// Units in stock.
    pub count: u32,
    /// Dimensions.
    pub size: Size,
    /// Free-form weight with unit (e.g. `200g`).
    pub weight: String,
    /// Linked comment ids in creation order.
    #[serde(default)]
    pub comments: Vec<CommentId>,
}

/// Editable product fields, as filled in by a create or edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    /// Image location.
    pub image_url: String,
    /// Display name.
    pub name: String,
    /// Units in stock.
    pub count: u32,
    /// Dimensions.
    pub size: Size,
    /// Free-form weight with unit.
    pub weight: String,
}

impl ProductDraft {
    /// Turn the draft into a new product with a freshly minted id and no
    /// comments.
    #[must_use]
    pub fn into_product(self) -> Product {
        Product {
            id: ProductId::generate(),
            image_url: self.image_url,
            name: self.name,
            count: self.count,
            size: self.size,
            weight: self.weight,
            comments: Vec::new(),
        }
    }
}

impl Product {
    /// Overwrite the editable fields with `draft`, keeping identity and
    /// comment links.
    #[must_use]
    pub fn apply(mut self, draft: ProductDraft) -> Self {
        self.image_url = draft.image_url;
        self.name = draft.name;
        self.count = draft.count;
        self.size = draft.size;
        self.weight = draft.weight;
        self
    }

    /// Extract the editable fields.
    #[must_use]
    pub fn draft(&self) -> ProductDraft {
        ProductDraft {
            image_url: self.image_url.clone(),
            name: self.name.clone(),
            count: self.count,
            size: self.size,
            weight: self.weight.clone(),
        }
    }

    /// Return a copy with `comment` appended to the comment links.
    #[must_use]
    pub fn with_comment(mut self, comment: CommentId) -> Self {
        self.comments.push(comment);
        self
    }

    /// Return a copy with every link to `comment` removed.
    #[must_use]
    pub fn without_comment(mut self, comment: &CommentId) -> Self {
        self.comments.retain(|id| id != comment);
        self
    }

    /// Whether this product links to `comment`.
    #[must_use]
    pub fn has_comment(&self, comment: &CommentId) -> bool {
        self.comments.contains(comment)
    }
}

// =============================================================================
// Sort Keys
// =============================================================================

/// Sort keys for rendering product lists.
///
/// Sorting is a presentation concern; the store keeps server order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortKey {
    /// Alphabetical by name, case-insensitive.
    #[default]
    Name,
    /// Ascending stock count.
    Count,
}

impl std::fmt::Display for ProductSortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Count => write!(f, "count"),
        }
    }
}

impl std::str::FromStr for ProductSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "count" => Ok(Self::Count),
            _ => Err(format!("invalid sort key: {s}")),
        }
    }
}

/// Return a sorted copy of `products`. The sort is stable.
#[must_use]
pub fn sort_products(products: &[Product], key: ProductSortKey) -> Vec<Product> {
    let mut sorted = products.to_vec();
    match key {
        ProductSortKey::Name => sorted.sort_by(|a, b| compare_names(&a.name, &b.name)),
        ProductSortKey::Count => sorted.sort_by_key(|p| p.count),
    }
    sorted
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
