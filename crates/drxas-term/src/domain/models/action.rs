use std::sync::Arc;

use super::ArtifactRequest;
use super::Dispatch;
use super::SessionState;

/// Work handed to the background workers.
#[derive(Debug, Clone)]
pub enum Action {
    HealthCheck,
    LoadCatalog,
    ResolveFormula {
        material_id: String,
    },
    FetchSpectrum {
        material_id: String,
        spectrum_id: String,
        snapshot: Arc<SessionState>,
    },
    FetchStructure {
        formula: String,
        snapshot: Arc<SessionState>,
    },
    Submit(Dispatch),
    ResolveArtifact(ArtifactRequest),
}
