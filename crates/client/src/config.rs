//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CATALOG_BASE_URL` - Backend root hosting `/products` and `/comments`
//!   (default: `http://localhost:3001`)
//! - `CATALOG_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)
//! - `CATALOG_MAILBOX_CAPACITY` - Pending store commands before callers wait
//!   (default: 64)
//! - `CATALOG_CASCADE_COMMENTS` - Delete a product's comments together with
//!   the product (default: false)

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::store::StoreOptions;

const DEFAULT_BASE_URL: &str = "http://localhost:3001";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Catalog client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend root URL
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Store command channel capacity
    pub mailbox_capacity: usize,
    /// Whether product deletion also deletes its comments
    pub cascade_comment_delete: bool,
}

impl ClientConfig {
    /// Configuration for `base_url` with every other setting at its default.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            cascade_comment_delete: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let base_url = parse_base_url(&get_or_default("CATALOG_BASE_URL", DEFAULT_BASE_URL))
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CATALOG_BASE_URL".to_string(), e.to_string())
            })?;

        let timeout_secs =
            get_or_default("CATALOG_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("CATALOG_TIMEOUT_SECS".to_string(), e.to_string())
                })?;

        let mailbox_capacity = get_or_default(
            "CATALOG_MAILBOX_CAPACITY",
            &DEFAULT_MAILBOX_CAPACITY.to_string(),
        )
        .parse::<usize>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("CATALOG_MAILBOX_CAPACITY".to_string(), e.to_string())
        })?;
        if mailbox_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_MAILBOX_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let cascade_comment_delete = lookup("CATALOG_CASCADE_COMMENTS")
            .map(|v| parse_bool("CATALOG_CASCADE_COMMENTS", &v))
            .transpose()?
            .unwrap_or(false);

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            mailbox_capacity,
            cascade_comment_delete,
        })
    }

    /// Store options derived from this configuration.
    #[must_use]
    pub const fn store_options(&self) -> StoreOptions {
        StoreOptions {
            mailbox_capacity: self.mailbox_capacity,
            cascade_comment_delete: self.cascade_comment_delete,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a backend root, rejecting URLs that cannot carry a path.
///
/// Used for `CATALOG_BASE_URL` and for any override given by the caller.
///
/// # Errors
///
/// Returns `ConfigError::InvalidBaseUrl` unless `raw` is an absolute http(s)
/// URL.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) URL".to_string()));
    }
    Ok(url)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other}"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:3001/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.mailbox_capacity, 64);
        assert!(!config.cascade_comment_delete);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("CATALOG_BASE_URL", "https://api.example.com/v1"),
            ("CATALOG_TIMEOUT_SECS", "5"),
            ("CATALOG_MAILBOX_CAPACITY", "8"),
            ("CATALOG_CASCADE_COMMENTS", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.base_url.as_str(), "https://api.example.com/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.cascade_comment_delete);

        let options = config.store_options();
        assert_eq!(options.mailbox_capacity, 8);
        assert!(options.cascade_comment_delete);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ClientConfig::from_lookup(lookup(&[("CATALOG_BASE_URL", "mailto:a@b.c")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "CATALOG_BASE_URL"));
    }

    #[test]
    fn test_parse_base_url() {
        let url = parse_base_url("https://api.example.com/v1/").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/");

        for raw in ["mailto:ops@example.com", "ftp://files.example.com/", "not a url"] {
            let err = parse_base_url(raw).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidBaseUrl { ref url, .. } if url == raw));
        }
    }

    #[test]
    fn test_invalid_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[("CATALOG_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "CATALOG_TIMEOUT_SECS"));
    }

    #[test]
    fn test_zero_mailbox_rejected() {
        let result = ClientConfig::from_lookup(lookup(&[("CATALOG_MAILBOX_CAPACITY", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_bool() {
        let result = ClientConfig::from_lookup(lookup(&[("CATALOG_CASCADE_COMMENTS", "maybe")]));
        assert!(result.is_err());
    }
}
