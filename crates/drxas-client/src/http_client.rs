use std::time::Duration;

use async_trait::async_trait;
use drxas_types::{Catalog, ChatRequest, DrXasError, DrXasResult, ResultEnvelope};
use reqwest::StatusCode;
use serde_json::Value;

use crate::BackendClient;

/// HTTP client for the analysis backend.
pub struct HttpBackendClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBackendClient {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Timeout for catalog, formula and file lookups. Chat requests are bounded
    /// by the submission controller instead.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> DrXasError {
        if err.is_timeout() {
            return DrXasError::Timeout {
                seconds: self.timeout.as_secs(),
            };
        }

        DrXasError::network(err.to_string())
    }

    async fn get(&self, path: &str) -> DrXasResult<reqwest::Response> {
        let response = self
            .client
            .get(self.url(path))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(response)
    }

    async fn bytes(&self, response: reqwest::Response) -> DrXasResult<Vec<u8>> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(bytes.to_vec())
    }
}

fn status_error(status: StatusCode) -> DrXasError {
    DrXasError::network(format!("API error: {status}"))
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn health_check(&self) -> DrXasResult<()> {
        if self.base_url.is_empty() {
            return Err(DrXasError::configuration("Backend URL is not defined"));
        }

        let response = self.get("/health").await?;
        if !response.status().is_success() {
            tracing::error!(status = response.status().as_u16(), "Backend health check failed");
            return Err(status_error(response.status()));
        }

        Ok(())
    }

    async fn chat(&self, request: ChatRequest) -> DrXasResult<ResultEnvelope> {
        let response = self
            .client
            .post(self.url("/chat"))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Chat request failed");
            return Err(status_error(status));
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| DrXasError::serialization(e.to_string()))?;

        ResultEnvelope::from_value(value)
    }

    async fn catalog(&self) -> DrXasResult<Catalog> {
        let response = self.get("/xafs_database").await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        response
            .json::<Catalog>()
            .await
            .map_err(|e| DrXasError::serialization(e.to_string()))
    }

    async fn chemical_formula(&self, material_id: &str) -> DrXasResult<String> {
        let path = format!("/chemical_formula/{}", urlencoding::encode(material_id));
        let response = self.get(&path).await?;
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| DrXasError::serialization(e.to_string()))?;

        match value {
            Value::String(formula) => Ok(formula.trim().to_string()),
            other => Err(DrXasError::serialization(format!(
                "expected a formula string, got {other}"
            ))),
        }
    }

    async fn spectrum(&self, spectrum_id: &str) -> DrXasResult<Vec<u8>> {
        let path = format!("/xafs/{}", urlencoding::encode(spectrum_id));
        let response = self.get(&path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DrXasError::not_found(format!("spectrum {spectrum_id}")));
        }
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        self.bytes(response).await
    }

    async fn structure(&self, formula: &str) -> DrXasResult<Vec<u8>> {
        let path = format!("/material_database/{}", urlencoding::encode(formula));
        let response = self.get(&path).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DrXasError::not_found(format!("structure file for {formula}")));
        }
        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        self.bytes(response).await
    }
}
