//! In-memory backend and storage doubles shared by the unit tests.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use drxas_client::BackendClient;
use drxas_client::ObjectStore;
use drxas_client::SignedUrl;
use drxas_types::Catalog;
use drxas_types::ChatRequest;
use drxas_types::DrXasError;
use drxas_types::DrXasResult;
use drxas_types::ResultEnvelope;

pub enum ChatReply {
    Envelope(ResultEnvelope),
    Fail(DrXasError),
    Delayed(Duration, ResultEnvelope),
    Hang,
}

#[derive(Default)]
pub struct MockBackend {
    pub healthy: bool,
    pub catalog: Option<Catalog>,
    pub formulas: HashMap<String, String>,
    pub spectra: HashMap<String, Vec<u8>>,
    pub structures: HashMap<String, Vec<u8>>,
    pub replies: Mutex<VecDeque<ChatReply>>,
    pub requests: Mutex<Vec<ChatRequest>>,
    pub lookups: AtomicUsize,
}

impl MockBackend {
    pub fn with_reply(self, reply: ChatReply) -> MockBackend {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        return self;
    }

    pub fn sent(&self) -> Vec<ChatRequest> {
        return self.requests.lock().unwrap().clone();
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn health_check(&self) -> DrXasResult<()> {
        if self.healthy {
            return Ok(());
        }
        return Err(DrXasError::network("connection refused"));
    }

    async fn chat(&self, request: ChatRequest) -> DrXasResult<ResultEnvelope> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(ChatReply::Envelope(envelope)) => return Ok(envelope),
            Some(ChatReply::Fail(err)) => return Err(err),
            Some(ChatReply::Delayed(delay, envelope)) => {
                tokio::time::sleep(delay).await;
                return Ok(envelope);
            }
            Some(ChatReply::Hang) => {
                std::future::pending::<()>().await;
                return Err(DrXasError::Cancelled);
            }
            None => return Ok(ResultEnvelope::from_text("ok")),
        }
    }

    async fn catalog(&self) -> DrXasResult<Catalog> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        return self
            .catalog
            .clone()
            .ok_or_else(|| DrXasError::network("API error: 503 Service Unavailable"));
    }

    async fn chemical_formula(&self, material_id: &str) -> DrXasResult<String> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        return self
            .formulas
            .get(material_id)
            .cloned()
            .ok_or_else(|| DrXasError::network("API error: 500 Internal Server Error"));
    }

    async fn spectrum(&self, spectrum_id: &str) -> DrXasResult<Vec<u8>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        return self
            .spectra
            .get(spectrum_id)
            .cloned()
            .ok_or_else(|| DrXasError::network("API error: 500 Internal Server Error"));
    }

    async fn structure(&self, formula: &str) -> DrXasResult<Vec<u8>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        return self
            .structures
            .get(formula)
            .cloned()
            .ok_or_else(|| DrXasError::not_found(format!("structure file for {formula}")));
    }
}

/// Signs every key as `https://signed.test/{key}` and serves `objects` by URL.
pub struct MockStore {
    pub credentials: bool,
    pub ttl_secs: i64,
    pub objects: HashMap<String, Vec<u8>>,
    pub presigned: AtomicUsize,
}

impl Default for MockStore {
    fn default() -> Self {
        return MockStore {
            credentials: true,
            ttl_secs: 3600,
            objects: HashMap::new(),
            presigned: AtomicUsize::new(0),
        };
    }
}

impl MockStore {
    pub fn with_object(mut self, url: &str, bytes: &[u8]) -> MockStore {
        self.objects.insert(url.to_string(), bytes.to_vec());
        return self;
    }

    pub fn signed(key: &str) -> String {
        return format!("https://signed.test/{key}");
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn presign_get(&self, key: &str) -> DrXasResult<SignedUrl> {
        if !self.credentials {
            return Err(DrXasError::configuration("AWS credentials not configured"));
        }

        self.presigned.fetch_add(1, Ordering::SeqCst);
        return Ok(SignedUrl {
            url: MockStore::signed(key),
            expires_at: Utc::now() + chrono::Duration::seconds(self.ttl_secs),
        });
    }

    async fn download(&self, url: &str) -> DrXasResult<Vec<u8>> {
        return self
            .objects
            .get(url)
            .cloned()
            .ok_or_else(|| DrXasError::not_found(format!("artifact {url}")));
    }
}

pub const NI_SPECTRUM: &str = "8330.0 0.10\n8340.0 0.35\n8350.0 1.20\n8360.0 0.95\n";

pub const NI_CIF: &str = "data_Ni\n_cell_length_a 3.524\n_cell_length_b 3.524\n_cell_length_c 3.524\n_cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\nloop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\nNi1 0 0 0\nNi2 0.5 0.5 0\nNi3 0.5 0 0.5\nNi4 0 0.5 0.5\n";
