//! Comment domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CommentId, ProductId};

/// A comment left on a product.
///
/// Comments form their own remote collection. The owning product keeps
/// the comment id in [`Product::comments`](super::Product::comments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Client-minted identity.
    pub id: CommentId,
    /// Owning product.
    pub product_id: ProductId,
    /// Comment text.
    pub description: String,
    /// Creation timestamp, immutable.
    pub date: DateTime<Utc>,
}

/// A comment as typed into the comment box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDraft {
    /// Comment text.
    pub description: String,
}

impl CommentDraft {
    /// Create a draft from raw text.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }

    /// Mint a comment for `product_id`, stamped with the current time.
    #[must_use]
    pub fn into_comment(self, product_id: ProductId) -> Comment {
        Comment {
            id: CommentId::generate(),
            product_id,
            description: self.description,
            date: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_into_comment_stamps_owner_and_date() {
        let before = Utc::now();
        let comment = CommentDraft::new("Sturdy").into_comment(ProductId::new("p1"));
        assert_eq!(comment.product_id, ProductId::new("p1"));
        assert_eq!(comment.description, "Sturdy");
        assert!(comment.date >= before);
    }

    #[test]
    fn test_parses_iso_timestamp() {
        let comment: Comment = serde_json::from_value(json!({
            "id": "c1",
            "productId": "p1",
            "description": "Nice",
            "date": "2024-03-01T10:15:00.000Z"
        }))
        .unwrap();
        assert_eq!(comment.date.to_rfc3339(), "2024-03-01T10:15:00+00:00");

        let value = serde_json::to_value(&comment).unwrap();
        assert_eq!(value["productId"], "p1");
    }
}
