//! S3-compatible object storage access.
//!
//! Result artifacts live in a private bucket; the client hands out
//! query-string signed GET URLs (AWS Signature V4) that expire after the
//! configured TTL, and downloads through them.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use drxas_types::{DrXasError, DrXasResult};
use reqwest::{StatusCode, Url};

use crate::{ObjectStore, SignedUrl, StorageConfig};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const MAX_TTL_SECS: u64 = 7 * 24 * 3600;

pub struct S3ObjectStore {
    client: reqwest::Client,
    config: StorageConfig,
}

impl S3ObjectStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Scheme, host header and canonical URI for a key.
    fn location(&self, key: &str) -> DrXasResult<(String, String, String)> {
        let key_path = encode_key(key);

        if let Some(endpoint) = self.config.endpoint.as_deref() {
            let url = Url::parse(endpoint).map_err(|e| {
                DrXasError::configuration(format!("invalid storage endpoint {endpoint}: {e}"))
            })?;
            let host = url.host_str().ok_or_else(|| {
                DrXasError::configuration(format!("storage endpoint {endpoint} has no host"))
            })?;
            let host = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            let uri = format!(
                "/{}/{}",
                urlencoding::encode(&self.config.bucket),
                key_path
            );

            return Ok((url.scheme().to_string(), host, uri));
        }

        let host = if self.config.region == "us-east-1" {
            format!("{}.s3.amazonaws.com", self.config.bucket)
        } else {
            format!("{}.s3.{}.amazonaws.com", self.config.bucket, self.config.region)
        };

        Ok(("https".to_string(), host, format!("/{key_path}")))
    }

    /// Sign a GET URL for `key` as of `now`.
    pub fn presign_at(&self, key: &str, now: DateTime<Utc>) -> DrXasResult<SignedUrl> {
        let key = key.trim_start_matches('/');
        if key.is_empty() {
            return Err(DrXasError::validation("storage key is empty"));
        }
        if !self.config.has_credentials() {
            return Err(DrXasError::configuration("AWS credentials not configured"));
        }
        if self.config.ttl_secs == 0 || self.config.ttl_secs > MAX_TTL_SECS {
            return Err(DrXasError::configuration(format!(
                "signed URL lifetime must be within 1..={MAX_TTL_SECS} seconds"
            )));
        }

        let access_key = self.config.access_key_id.as_deref().unwrap_or_default();
        let secret_key = self.config.secret_access_key.as_deref().unwrap_or_default();

        let (scheme, host, uri) = self.location(key)?;
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = &amz_date[..8];
        let credential_scope = format!("{date}/{}/s3/aws4_request", self.config.region);

        let query = format!(
            "X-Amz-Algorithm={ALGORITHM}&X-Amz-Credential={}&X-Amz-Date={amz_date}&X-Amz-Expires={}&X-Amz-SignedHeaders=host",
            urlencoding::encode(&format!("{access_key}/{credential_scope}")),
            self.config.ttl_secs,
        );

        let canonical_request =
            format!("GET\n{uri}\n{query}\nhost:{host}\n\nhost\nUNSIGNED-PAYLOAD");
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.config.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, b"s3")?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

        tracing::debug!(key = %key, host = %host, ttl = self.config.ttl_secs, "Signed storage URL");

        Ok(SignedUrl {
            url: format!("{scheme}://{host}{uri}?{query}&X-Amz-Signature={signature}"),
            expires_at: now + Duration::seconds(self.config.ttl_secs as i64),
        })
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn presign_get(&self, key: &str) -> DrXasResult<SignedUrl> {
        self.presign_at(key, Utc::now())
    }

    async fn download(&self, url: &str) -> DrXasResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DrXasError::network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::FORBIDDEN {
            return Err(DrXasError::not_found(format!("artifact ({status})")));
        }
        if !status.is_success() {
            return Err(DrXasError::network(format!("storage error: {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DrXasError::network(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

/// Percent-encode every path segment of a key, keeping the separators.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn sha256_hex(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> DrXasResult<Vec<u8>> {
    use hmac::{Hmac, Mac};
    type HmacSha256 = Hmac<sha2::Sha256>;

    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| DrXasError::configuration(format!("invalid signing key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
