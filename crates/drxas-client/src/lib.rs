//! Client SDK for the Dr.XAS analysis backend and its object storage
//!
//! The session core never talks HTTP directly. It sees two seams: a
//! [`BackendClient`] covering the analysis and catalog endpoints, and an
//! [`ObjectStore`] that turns storage keys into time-limited retrieval URLs and
//! downloads artifacts. Both are traits so that the core can be driven by
//! in-memory doubles in tests and by the reqwest implementations in this crate
//! in production.

use async_trait::async_trait;
use drxas_types::{Catalog, ChatRequest, DrXasResult, ResultEnvelope};

pub mod http_client;
pub mod storage;
pub mod types;

pub use types::*;

/// Endpoints of the analysis backend.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Check if the backend is reachable.
    async fn health_check(&self) -> DrXasResult<()>;

    /// Submit one analysis request (`POST /chat`).
    async fn chat(&self, request: ChatRequest) -> DrXasResult<ResultEnvelope>;

    /// Material to spectrum catalog (`GET /xafs_database`).
    async fn catalog(&self) -> DrXasResult<Catalog>;

    /// Chemical formula of a catalog material (`GET /chemical_formula/{id}`).
    async fn chemical_formula(&self, material_id: &str) -> DrXasResult<String>;

    /// Raw spectrum payload (`GET /xafs/{id}`).
    async fn spectrum(&self, spectrum_id: &str) -> DrXasResult<Vec<u8>>;

    /// Crystal structure file for a formula (`GET /material_database/{formula}`).
    ///
    /// A missing structure is reported as `DrXasError::NotFound`, distinct from
    /// transport failures.
    async fn structure(&self, formula: &str) -> DrXasResult<Vec<u8>>;
}

/// Object storage holding result artifacts.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Issue a signed, time-limited GET URL for a storage key.
    async fn presign_get(&self, key: &str) -> DrXasResult<SignedUrl>;

    /// Download the content behind a retrieval URL.
    async fn download(&self, url: &str) -> DrXasResult<Vec<u8>>;
}

pub type BackendClientBox = Box<dyn BackendClient>;
pub type ObjectStoreBox = Box<dyn ObjectStore>;

/// Factory for the production clients.
pub struct ClientFactory;

impl ClientFactory {
    /// Create an HTTP client for the analysis backend.
    pub fn create_backend_client(base_url: String) -> BackendClientBox {
        Box::new(http_client::HttpBackendClient::new(base_url))
    }

    /// Create an S3 presigning store.
    pub fn create_object_store(config: StorageConfig) -> ObjectStoreBox {
        Box::new(storage::S3ObjectStore::new(config))
    }
}
