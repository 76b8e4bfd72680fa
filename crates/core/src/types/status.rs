//! Store status and the read-only snapshot handed to views.

use serde::{Deserialize, Serialize};

use super::product::Product;

/// Synchronization status of a store instance.
///
/// `Idle -> Loading -> (Idle | Error)` on load. Any failed operation moves
/// the store to `Error`; only a successful load returns it to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "message")]
pub enum StoreStatus {
    #[default]
    Idle,
    Loading,
    /// Human-readable description of the last failure.
    Error(String),
}

impl StoreStatus {
    /// Whether a load is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The failure message, if the store is in the error state.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// Point-in-time view of a store: the product list in server order plus
/// the current status.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Products in last-known server order.
    pub items: Vec<Product>,
    /// Current status.
    pub status: StoreStatus,
}

impl Snapshot {
    /// Find a product by id.
    #[must_use]
    pub fn get(&self, id: &super::ProductId) -> Option<&Product> {
        self.items.iter().find(|p| &p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle_and_empty() {
        let snapshot = Snapshot::default();
        assert!(snapshot.items.is_empty());
        assert_eq!(snapshot.status, StoreStatus::Idle);
    }

    #[test]
    fn test_error_message() {
        let status = StoreStatus::Error("boom".to_string());
        assert_eq!(status.error_message(), Some("boom"));
        assert_eq!(status.to_string(), "error: boom");
        assert!(!status.is_loading());
        assert_eq!(StoreStatus::Loading.error_message(), None);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&StoreStatus::Error("x".into())).unwrap();
        assert_eq!(json, r#"{"state":"error","message":"x"}"#);
        let json = serde_json::to_string(&StoreStatus::Idle).unwrap();
        assert_eq!(json, r#"{"state":"idle"}"#);
    }
}
