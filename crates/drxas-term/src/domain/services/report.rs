#[cfg(test)]
#[path = "report_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::DateTime;
use chrono::Utc;
use drxas_client::is_network_locator;
use drxas_client::ObjectStore;
use drxas_types::ArtifactKind;
use drxas_types::DrXasError;
use drxas_types::ResultEnvelope;

use crate::domain::models::ArtifactRef;
use crate::domain::models::ArtifactRequest;
use crate::domain::models::PanelKind;
use crate::domain::models::PanelState;
use crate::domain::models::ResolvedArtifact;
use crate::domain::models::SpectrumContent;
use crate::domain::models::SpectrumData;
use crate::domain::models::StructureModel;
use crate::domain::models::ViewTransform;

/// Body of the results table panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableBody {
    Rows(Vec<Vec<String>>),
    Text(String),
}

/// The rendered state of one result envelope.
#[derive(Clone, Debug)]
pub struct Report {
    generation: u64,
    envelope: ResultEnvelope,
    artifacts: BTreeMap<ArtifactKind, ArtifactRef>,
    refreshing: BTreeSet<ArtifactKind>,
    collapsed: BTreeSet<PanelKind>,
    transforms: BTreeMap<PanelKind, ViewTransform>,
    pub spectrum: PanelState<SpectrumContent>,
    pub structure: PanelState<StructureModel>,
    pub fitting: PanelState<String>,
}

impl Report {
    fn new(generation: u64, envelope: ResultEnvelope) -> (Report, Vec<ArtifactRequest>) {
        let mut report = Report {
            generation,
            envelope,
            artifacts: BTreeMap::new(),
            refreshing: BTreeSet::new(),
            collapsed: BTreeSet::new(),
            transforms: BTreeMap::new(),
            spectrum: PanelState::Empty,
            structure: PanelState::Empty,
            fitting: PanelState::Empty,
        };

        let mut requests = vec![];
        for kind in ArtifactKind::ALL {
            let Some(locator) = report.envelope.artifact(kind).map(str::to_string) else {
                continue;
            };

            report.artifacts.insert(kind, ArtifactRef::new(kind, &locator));
            report.set_loading(kind);
            requests.push(ArtifactRequest {
                generation,
                kind,
                locator,
            });
        }

        return (report, requests);
    }

    pub fn generation(&self) -> u64 {
        return self.generation;
    }

    pub fn envelope(&self) -> &ResultEnvelope {
        return &self.envelope;
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&ArtifactRef> {
        return self.artifacts.get(&kind);
    }

    pub fn headline(&self) -> Option<&str> {
        return self.envelope.headline();
    }

    pub fn table(&self) -> TableBody {
        match self.envelope.messages.rows() {
            Some(rows) => return TableBody::Rows(rows),
            None => return TableBody::Text(self.envelope.messages.text()),
        }
    }

    pub fn is_collapsed(&self, panel: PanelKind) -> bool {
        return self.collapsed.contains(&panel);
    }

    pub fn toggle(&mut self, panel: PanelKind) {
        if !self.collapsed.remove(&panel) {
            self.collapsed.insert(panel);
        }
    }

    pub fn transform(&self, panel: PanelKind) -> ViewTransform {
        return self.transforms.get(&panel).copied().unwrap_or_default();
    }

    pub fn zoom_in(&mut self, panel: PanelKind) {
        self.transforms.entry(panel).or_default().zoom_in();
    }

    pub fn zoom_out(&mut self, panel: PanelKind) {
        self.transforms.entry(panel).or_default().zoom_out();
    }

    pub fn pan(&mut self, panel: PanelKind, dx: f64, dy: f64) {
        self.transforms.entry(panel).or_default().pan(dx, dy);
    }

    fn set_loading(&mut self, kind: ArtifactKind) {
        match kind {
            ArtifactKind::Spectrum => self.spectrum = PanelState::Loading,
            ArtifactKind::Structure => self.structure = PanelState::Loading,
            ArtifactKind::Fitting => self.fitting = PanelState::Loading,
        }
    }

    fn set_failed(&mut self, kind: ArtifactKind, message: String) {
        match kind {
            ArtifactKind::Spectrum => self.spectrum = PanelState::Failed(message),
            ArtifactKind::Structure => self.structure = PanelState::Failed(message),
            ArtifactKind::Fitting => self.fitting = PanelState::Failed(message),
        }
    }

    fn apply(&mut self, kind: ArtifactKind, result: Result<ResolvedArtifact, DrXasError>) {
        self.refreshing.remove(&kind);

        let resolved = match result {
            Ok(resolved) => resolved,
            Err(err) => {
                tracing::warn!(artifact = kind.field_name(), error = %err, "Artifact failed to load");
                self.set_failed(kind, err.to_string());
                return;
            }
        };

        let Some(artifact) = self.artifacts.get_mut(&kind) else {
            return;
        };
        artifact.resolved_url = Some(resolved.url.to_string());
        artifact.expires_at = resolved.expires_at;
        let name = artifact.file_name().to_string();

        match kind {
            ArtifactKind::Spectrum => {
                let text = String::from_utf8_lossy(&resolved.bytes);
                self.spectrum = match SpectrumData::parse(&name, &text) {
                    Some(data) => PanelState::Ready(SpectrumContent::Plot(data)),
                    None => PanelState::Ready(SpectrumContent::Image { url: resolved.url }),
                };
            }
            ArtifactKind::Structure => {
                let text = String::from_utf8_lossy(&resolved.bytes);
                self.structure = match StructureModel::parse_cif(&name, &text) {
                    Ok(model) => PanelState::Ready(model),
                    Err(err) => PanelState::Failed(format!("Failed to load CIF file: {err}")),
                };
            }
            ArtifactKind::Fitting => {
                self.fitting = PanelState::Ready(resolved.url);
            }
        }
    }

    /// Storage artifacts whose URL expired while their panel is shown.
    fn expired(&mut self, now: DateTime<Utc>) -> Vec<ArtifactRequest> {
        let mut requests = vec![];
        for (kind, artifact) in &self.artifacts {
            if !artifact.is_storage_backed()
                || !artifact.is_expired(now)
                || self.refreshing.contains(kind)
                || self.collapsed.contains(&PanelKind::for_artifact(*kind))
            {
                continue;
            }

            requests.push(ArtifactRequest {
                generation: self.generation,
                kind: *kind,
                locator: artifact.storage_key.to_string(),
            });
        }

        for request in &requests {
            self.refreshing.insert(request.kind);
        }

        return requests;
    }
}

/// Owns the report being shown and discards results for replaced ones.
#[derive(Default)]
pub struct ReportPipeline {
    generation: u64,
    current: Option<Report>,
}

impl ReportPipeline {
    pub fn current(&self) -> Option<&Report> {
        return self.current.as_ref();
    }

    pub fn current_mut(&mut self) -> Option<&mut Report> {
        return self.current.as_mut();
    }

    /// Replaces the report and returns the artifacts to resolve for it.
    pub fn load(&mut self, envelope: ResultEnvelope) -> Vec<ArtifactRequest> {
        self.generation += 1;
        let (report, requests) = Report::new(self.generation, envelope);
        tracing::debug!(
            generation = self.generation,
            artifacts = requests.len(),
            "Report loaded"
        );

        self.current = Some(report);
        return requests;
    }

    pub fn clear(&mut self) {
        self.generation += 1;
        self.current = None;
    }

    /// Applies a resolution. Returns false when it belongs to a replaced report.
    pub fn apply(
        &mut self,
        generation: u64,
        kind: ArtifactKind,
        result: Result<ResolvedArtifact, DrXasError>,
    ) -> bool {
        match self.current.as_mut() {
            Some(report) if report.generation == generation => {
                report.apply(kind, result);
                return true;
            }
            _ => {
                tracing::debug!(generation = generation, "Discarding stale artifact");
                return false;
            }
        }
    }

    pub fn refresh_due(&mut self, now: DateTime<Utc>) -> Vec<ArtifactRequest> {
        match self.current.as_mut() {
            Some(report) => return report.expired(now),
            None => return vec![],
        }
    }
}

/// Turns an artifact locator into a retrieval URL and downloads it.
pub async fn resolve_artifact(
    store: &dyn ObjectStore,
    locator: &str,
) -> Result<ResolvedArtifact, DrXasError> {
    let (url, expires_at) = if is_network_locator(locator) {
        (locator.trim().to_string(), None)
    } else {
        let signed = store.presign_get(locator).await?;
        (signed.url, Some(signed.expires_at))
    };

    let bytes = store.download(&url).await?;
    return Ok(ResolvedArtifact {
        url,
        expires_at,
        bytes,
    });
}
