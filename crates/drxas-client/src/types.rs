use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A retrieval URL issued for a storage key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

impl SignedUrl {
    /// Whether the URL may still be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Object storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket holding the artifacts.
    pub bucket: String,
    /// Region used in the signing scope.
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...); path-style addressing is used when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    /// Lifetime of issued URLs.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_region() -> String {
    "eu-north-1".to_string()
}

fn default_ttl_secs() -> u64 {
    3600
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "test-dr-xas".to_string(),
            region: default_region(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl StorageConfig {
    /// Read settings from the `AWS_*` environment variables.
    ///
    /// - `AWS_BUCKET_NAME`: bucket (default `test-dr-xas`)
    /// - `AWS_REGION_NAME` or `AWS_REGION`: region (default `eu-north-1`)
    /// - `AWS_ENDPOINT_URL`: custom endpoint
    /// - `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`: credentials
    pub fn from_env() -> Self {
        let defaults = StorageConfig::default();
        Self {
            bucket: std::env::var("AWS_BUCKET_NAME").unwrap_or(defaults.bucket),
            region: std::env::var("AWS_REGION_NAME")
                .or_else(|_| std::env::var("AWS_REGION"))
                .unwrap_or(defaults.region),
            endpoint: std::env::var("AWS_ENDPOINT_URL").ok(),
            access_key_id: std::env::var("AWS_ACCESS_KEY_ID").ok(),
            secret_access_key: std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
            ttl_secs: defaults.ttl_secs,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.access_key_id.as_deref().is_some_and(|k| !k.is_empty())
            && self
                .secret_access_key
                .as_deref()
                .is_some_and(|k| !k.is_empty())
    }
}

/// Whether a locator already is a fully-qualified network URL rather than a
/// storage key.
pub fn is_network_locator(locator: &str) -> bool {
    let lower = locator.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
