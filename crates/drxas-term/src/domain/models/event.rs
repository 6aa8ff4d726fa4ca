use drxas_types::ArtifactKind;
use drxas_types::Catalog;
use drxas_types::DrXasError;

use super::AttachedFile;
use super::FileOrigin;
use super::PanelKind;
use super::RequestId;
use super::ResolvedArtifact;
use super::SubmissionOutcome;
use super::Tab;

/// Everything the control loop reacts to: user intents and worker results.
#[derive(Debug)]
pub enum Event {
    InputChanged(String),
    Submit,
    Retry,
    Undo,
    Clear,
    DismissBanner,
    AttachFile {
        name: String,
        bytes: Vec<u8>,
        origin: FileOrigin,
    },
    RemoveFile(String),
    SelectMaterial(String),
    FormulaChanged(String),
    SearchStructure,
    SelectTab(Tab),
    ShowReport,
    HideReport,
    TogglePanel(PanelKind),
    ZoomIn(PanelKind),
    ZoomOut(PanelKind),
    Pan {
        panel: PanelKind,
        dx: f64,
        dy: f64,
    },
    Quit,

    BackendHealth(Result<(), DrXasError>),
    CatalogLoaded(Catalog),
    FormulaResolved {
        material_id: String,
        formula: String,
    },
    SpectrumFetched {
        material_id: String,
        result: Result<Option<AttachedFile>, DrXasError>,
    },
    StructureFetched {
        formula: String,
        result: Result<Option<AttachedFile>, DrXasError>,
    },
    SubmissionSettled {
        id: RequestId,
        outcome: SubmissionOutcome,
    },
    ArtifactResolved {
        generation: u64,
        kind: ArtifactKind,
        result: Result<ResolvedArtifact, DrXasError>,
    },
    UITick,
}
