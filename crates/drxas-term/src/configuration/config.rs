#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

static CONFIG: Lazy<DashMap<String, String>> = Lazy::new(DashMap::new);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    BackendUrl,
    ConfigFile,
    ConversationId,
    LogFile,
    RequestTimeoutSecs,
    SignedUrlTtlSecs,
    StorageAccessKeyId,
    StorageBucket,
    StorageEndpoint,
    StorageRegion,
    StorageSecretAccessKey,
}

impl ConfigKey {
    pub fn description(&self) -> &'static str {
        match self {
            ConfigKey::BackendUrl => return "Base URL of the analysis backend.",
            ConfigKey::ConfigFile => return "Path to the config file.",
            ConfigKey::ConversationId => {
                return "Conversation id sent with every request. Generated when empty."
            }
            ConfigKey::LogFile => return "File the JSON logs are written to.",
            ConfigKey::RequestTimeoutSecs => {
                return "Seconds before an analysis request is aborted."
            }
            ConfigKey::SignedUrlTtlSecs => return "Lifetime of signed storage URLs in seconds.",
            ConfigKey::StorageAccessKeyId => return "Access key id used to sign storage URLs.",
            ConfigKey::StorageBucket => return "Bucket holding result artifacts.",
            ConfigKey::StorageEndpoint => {
                return "Custom S3-compatible endpoint. Path-style URLs are used when set."
            }
            ConfigKey::StorageRegion => return "Region of the artifact bucket.",
            ConfigKey::StorageSecretAccessKey => {
                return "Secret access key used to sign storage URLs."
            }
        }
    }

    /// Environment variables overriding the key, first match wins.
    pub fn env_vars(&self) -> &'static [&'static str] {
        match self {
            ConfigKey::BackendUrl => return &["DRXAS_BACKEND_URL"],
            ConfigKey::ConfigFile => return &["DRXAS_CONFIG_FILE"],
            ConfigKey::ConversationId => return &["DRXAS_CONVERSATION_ID"],
            ConfigKey::LogFile => return &["DRXAS_LOG_FILE"],
            ConfigKey::RequestTimeoutSecs => return &["DRXAS_REQUEST_TIMEOUT_SECS"],
            ConfigKey::SignedUrlTtlSecs => return &["DRXAS_SIGNED_URL_TTL_SECS"],
            ConfigKey::StorageAccessKeyId => return &["AWS_ACCESS_KEY_ID"],
            ConfigKey::StorageBucket => return &["AWS_BUCKET_NAME"],
            ConfigKey::StorageEndpoint => return &["AWS_ENDPOINT_URL"],
            ConfigKey::StorageRegion => return &["AWS_REGION_NAME", "AWS_REGION"],
            ConfigKey::StorageSecretAccessKey => return &["AWS_SECRET_ACCESS_KEY"],
        }
    }

    fn is_numeric(&self) -> bool {
        return matches!(
            self,
            ConfigKey::RequestTimeoutSecs | ConfigKey::SignedUrlTtlSecs
        );
    }

    fn is_secret(&self) -> bool {
        return matches!(
            self,
            ConfigKey::StorageAccessKeyId | ConfigKey::StorageSecretAccessKey
        );
    }
}

pub struct Config {}

impl Config {
    pub fn get(key: ConfigKey) -> String {
        if let Some(val) = CONFIG.get(&key.to_string()) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn get_u64(key: ConfigKey) -> Result<u64> {
        let val = Config::get(key);
        match val.parse::<u64>() {
            Ok(parsed) => return Ok(parsed),
            Err(_) => bail!(format!("Config key '{key}' must be a whole number, got '{val}'")),
        }
    }

    pub fn set(key: ConfigKey, value: &str) {
        CONFIG.insert(key.to_string(), value.to_string());
    }

    pub fn default(key: ConfigKey) -> String {
        let base_dir = |dir: Option<path::PathBuf>| {
            return dir.unwrap_or_else(|| path::PathBuf::from(".")).join("drxas");
        };

        let res = match key {
            ConfigKey::BackendUrl => "http://localhost:8000".to_string(),
            ConfigKey::RequestTimeoutSecs => "120".to_string(),
            ConfigKey::SignedUrlTtlSecs => "3600".to_string(),
            ConfigKey::StorageBucket => "test-dr-xas".to_string(),
            ConfigKey::StorageRegion => "eu-north-1".to_string(),
            ConfigKey::StorageEndpoint => "".to_string(),
            ConfigKey::StorageAccessKeyId => "".to_string(),
            ConfigKey::StorageSecretAccessKey => "".to_string(),

            // Special
            ConfigKey::ConfigFile => base_dir(dirs::config_dir())
                .join("config.toml")
                .to_string_lossy()
                .to_string(),
            ConfigKey::LogFile => base_dir(dirs::cache_dir())
                .join("drxas.log")
                .to_string_lossy()
                .to_string(),
            ConfigKey::ConversationId => "".to_string(),
        };

        return res;
    }

    /// Loads defaults, then the config file, then environment overrides.
    pub async fn load(config_file: Option<&str>) -> Result<()> {
        for key in ConfigKey::iter() {
            Config::set(key, &Config::default(key))
        }

        let config_file = match config_file {
            Some(file) => file.to_string(),
            None => env_value(ConfigKey::ConfigFile)
                .unwrap_or_else(|| Config::default(ConfigKey::ConfigFile)),
        };
        Config::set(ConfigKey::ConfigFile, &config_file);

        let config_path = path::PathBuf::from(&config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                if key == ConfigKey::ConfigFile {
                    continue;
                }

                if let Some(val) = doc.get(&key.to_string()) {
                    if let Some(val_int) = val.as_integer() {
                        if val_int < 0 {
                            bail!(format!(
                                "config.toml has an invalid value for key '{key}': {val_int}"
                            ));
                        }
                        Config::set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if key.is_numeric() && val_str.parse::<u64>().is_err() {
                            bail!(format!(
                                "config.toml has an invalid value for key '{key}': {val_str}"
                            ));
                        }
                        Config::set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            if key == ConfigKey::ConfigFile {
                continue;
            }
            if let Some(val) = env_value(key) {
                if key.is_numeric() && val.parse::<u64>().is_err() {
                    bail!(format!(
                        "{} has an invalid value for key '{key}': {val}",
                        key.env_vars().join("/")
                    ));
                }
                Config::set(key, &val);
            }
        }

        if Config::get(ConfigKey::ConversationId).is_empty() {
            Config::set(ConfigKey::ConversationId, &uuid::Uuid::new_v4().to_string());
        }

        tracing::debug!(
            backend_url = %Config::get(ConfigKey::BackendUrl),
            conversation_id = %Config::get(ConfigKey::ConversationId),
            storage_bucket = %Config::get(ConfigKey::StorageBucket),
            storage_region = %Config::get(ConfigKey::StorageRegion),
            "config"
        );

        return Ok(());
    }

    pub fn serialize_default() -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConversationId || key == ConfigKey::ConfigFile {
                    return None;
                }

                let mut val = Config::default(key);
                if val.is_empty() || key.is_secret() {
                    val = format!("# {key} = \"\"");
                } else if key.is_numeric() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {}\n{val}", key.description()));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}

fn env_value(key: ConfigKey) -> Option<String> {
    return key
        .env_vars()
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|val| !val.is_empty());
}
