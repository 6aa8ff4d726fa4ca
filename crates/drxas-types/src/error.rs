//! Error taxonomy shared by the backend client and the session core.

use thiserror::Error;

/// Errors that can occur while talking to the analysis backend or object storage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrXasError {
    /// A request or response failed in transport, or the backend answered non-2xx.
    #[error("Network error: {message}")]
    Network { message: String },

    /// The request was aborted after the fixed ceiling elapsed.
    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The resolver had no match, e.g. no structure file for a formula.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// Required settings, such as storage signing credentials, are missing.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Input was rejected before any request was issued.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The operation was aborted by the user.
    #[error("Request cancelled")]
    Cancelled,

    /// A payload could not be encoded or decoded.
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DrXasError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<serde_json::Error> for DrXasError {
    fn from(err: serde_json::Error) -> Self {
        DrXasError::serialization(err.to_string())
    }
}

/// Result type for backend and storage operations.
pub type DrXasResult<T> = Result<T, DrXasError>;
