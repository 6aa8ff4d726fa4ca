use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;
use drxas_client::BackendClient;
use drxas_client::ClientFactory;
use drxas_client::ObjectStore;
use drxas_client::StorageConfig;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

/// Builds the production clients from the loaded configuration.
pub struct ClientManager {}

impl ClientManager {
    pub fn backend() -> Result<Arc<dyn BackendClient>> {
        let url = Config::get(ConfigKey::BackendUrl);
        if url.is_empty() {
            bail!(format!(
                "No backend URL configured, set '{}' in the config file or DRXAS_BACKEND_URL",
                ConfigKey::BackendUrl
            ));
        }

        return Ok(Arc::from(ClientFactory::create_backend_client(url)));
    }

    pub fn object_store() -> Result<Arc<dyn ObjectStore>> {
        let config = ClientManager::storage_config(Config::get)?;
        if !config.has_credentials() {
            tracing::warn!(
                bucket = %config.bucket,
                "Storage credentials missing, storage-backed artifacts will fail to load"
            );
        }

        return Ok(Arc::from(ClientFactory::create_object_store(config)));
    }

    pub fn storage_config<F>(get: F) -> Result<StorageConfig>
    where
        F: Fn(ConfigKey) -> String,
    {
        let optional = |key: ConfigKey| Some(get(key)).filter(|v| !v.is_empty());
        let ttl = get(ConfigKey::SignedUrlTtlSecs);
        let Ok(ttl_secs) = ttl.parse::<u64>() else {
            bail!(format!(
                "'{}' must be a number of seconds, got '{ttl}'",
                ConfigKey::SignedUrlTtlSecs
            ));
        };

        return Ok(StorageConfig {
            bucket: get(ConfigKey::StorageBucket),
            region: get(ConfigKey::StorageRegion),
            endpoint: optional(ConfigKey::StorageEndpoint),
            access_key_id: optional(ConfigKey::StorageAccessKeyId),
            secret_access_key: optional(ConfigKey::StorageSecretAccessKey),
            ttl_secs,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(values: HashMap<ConfigKey, &'static str>) -> impl Fn(ConfigKey) -> String {
        return move |key| {
            return values
                .get(&key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| Config::default(key));
        };
    }

    #[test]
    fn test_storage_config_from_defaults() {
        let config = ClientManager::storage_config(lookup(HashMap::new())).unwrap();
        assert_eq!(config.bucket, "test-dr-xas");
        assert_eq!(config.region, "eu-north-1");
        assert_eq!(config.ttl_secs, 3600);
        assert_eq!(config.endpoint, None);
        assert!(!config.has_credentials());
    }

    #[test]
    fn test_storage_config_overrides() {
        let config = ClientManager::storage_config(lookup(HashMap::from([
            (ConfigKey::StorageEndpoint, "http://localhost:9000"),
            (ConfigKey::StorageAccessKeyId, "minio"),
            (ConfigKey::StorageSecretAccessKey, "minio123"),
            (ConfigKey::SignedUrlTtlSecs, "600"),
        ])))
        .unwrap();

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
        assert!(config.has_credentials());
        assert_eq!(config.ttl_secs, 600);
    }

    #[test]
    fn test_storage_config_rejects_bad_ttl() {
        let res = ClientManager::storage_config(lookup(HashMap::from([(
            ConfigKey::SignedUrlTtlSecs,
            "an hour",
        )])));
        assert!(res.is_err());
    }
}
