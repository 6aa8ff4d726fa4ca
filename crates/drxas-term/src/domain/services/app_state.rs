use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use drxas_types::Catalog;
use tokio::sync::mpsc;

use super::resolver::STRUCTURE_NOT_FOUND_TEXT;
use super::ReportPipeline;
use super::SessionStore;
use super::SubmissionController;
use super::SubmitOutcome;
use crate::domain::models::Action;
use crate::domain::models::AttachedFile;
use crate::domain::models::Event;
use crate::domain::models::MaterialSelection;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Role;
use crate::domain::models::Tab;

#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

pub struct AppStateProps {
    pub conversation_id: String,
    pub request_timeout: Duration,
}

/// Everything the control loop owns. Only `handle_event` mutates it.
pub struct AppState {
    pub store: SessionStore,
    pub catalog: Catalog,
    pub controller: SubmissionController,
    pub report: ReportPipeline,
    pub selected_material: Option<String>,
    pub structure_error: Option<String>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl AppState {
    pub fn new(props: AppStateProps, action_tx: mpsc::UnboundedSender<Action>) -> Result<AppState> {
        action_tx.send(Action::HealthCheck)?;
        action_tx.send(Action::LoadCatalog)?;

        return Ok(AppState {
            store: SessionStore::new(),
            catalog: Catalog::default(),
            controller: SubmissionController::new(&props.conversation_id, props.request_timeout),
            report: ReportPipeline::default(),
            selected_material: None,
            structure_error: None,
            action_tx,
        });
    }

    /// Applies one event. Returns true when the loop should stop.
    pub fn handle_event(&mut self, event: Event) -> Result<bool> {
        match event {
            Event::InputChanged(text) => {
                self.store.apply(|s| s.set_input(&text));
            }
            Event::Submit => {
                let input = self.store.state().input.to_string();
                self.submit(&input)?;
            }
            Event::Retry => {
                let outcome = self.controller.retry(&mut self.store);
                self.follow(outcome)?;
            }
            Event::Undo => self.undo(),
            Event::Clear => self.clear(),
            Event::DismissBanner => {
                self.store.apply(|s| s.dismiss_banner());
                self.controller.acknowledge();
            }
            Event::AttachFile {
                name,
                bytes,
                origin,
            } => {
                self.attach(AttachedFile::new(&name, &bytes, origin));
            }
            Event::RemoveFile(name) => self.remove_file(&name),
            Event::SelectMaterial(material_id) => self.select_material(&material_id)?,
            Event::FormulaChanged(formula) => {
                self.store.apply(|s| s.set_formula_query(&formula));
            }
            Event::SearchStructure => self.search_structure()?,
            Event::SelectTab(tab) => {
                self.store.apply(|s| s.set_active_tab(tab));
            }
            Event::ShowReport => {
                self.store.apply(|s| s.show_report());
                self.refresh_artifacts()?;
            }
            Event::HideReport => {
                self.store.apply(|s| s.hide_report());
            }
            Event::TogglePanel(panel) => {
                if let Some(report) = self.report.current_mut() {
                    report.toggle(panel);
                }
                self.refresh_artifacts()?;
            }
            Event::ZoomIn(panel) => {
                if let Some(report) = self.report.current_mut() {
                    report.zoom_in(panel);
                }
            }
            Event::ZoomOut(panel) => {
                if let Some(report) = self.report.current_mut() {
                    report.zoom_out(panel);
                }
            }
            Event::Pan { panel, dx, dy } => {
                if let Some(report) = self.report.current_mut() {
                    report.pan(panel, dx, dy);
                }
            }
            Event::Quit => {
                self.controller.reset();
                return Ok(true);
            }

            Event::BackendHealth(result) => {
                if let Err(err) = result {
                    tracing::error!(error = %err, "Backend is unreachable");
                    self.store.append_message(Message::new_with_type(
                        Role::Assistant,
                        MessageType::Error,
                        &format!("The analysis backend is not reachable, requests will likely fail.\n\nError: {err}"),
                    ));
                }
            }
            Event::CatalogLoaded(catalog) => {
                self.catalog = catalog;
            }
            Event::FormulaResolved {
                material_id,
                formula,
            } => {
                if self.selected_material.as_deref() != Some(material_id.as_str()) {
                    tracing::debug!(material_id = %material_id, "Discarding formula for an old selection");
                    return Ok(false);
                }
                self.store.apply(|s| {
                    s.set_selection_formula(&material_id, &formula)
                        .set_formula_query(&formula)
                });
            }
            Event::SpectrumFetched {
                material_id,
                result,
            } => match result {
                Ok(Some(file)) => {
                    if self.store.state().selection(&material_id).is_none() {
                        tracing::debug!(material_id = %material_id, "Discarding spectrum for a removed selection");
                        return Ok(false);
                    }
                    self.attach(file);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(material_id = %material_id, error = %err, "Spectrum download failed");
                }
            },
            Event::StructureFetched { formula, result } => match result {
                Ok(file) => {
                    self.structure_error = None;
                    if let Some(file) = file {
                        self.attach(file);
                    }
                    self.store.apply(|s| s.add_material(&formula));
                }
                Err(err) if err.is_not_found() => {
                    tracing::warn!(formula = %formula, "No structure file");
                    self.structure_error = Some(STRUCTURE_NOT_FOUND_TEXT.to_string());
                }
                Err(err) => {
                    tracing::warn!(formula = %formula, error = %err, "Structure download failed");
                    self.structure_error = Some(err.to_string());
                }
            },
            Event::SubmissionSettled { id, outcome } => {
                if let Some(envelope) = self.controller.settle(&mut self.store, id, outcome) {
                    for request in self.report.load(envelope) {
                        self.action_tx.send(Action::ResolveArtifact(request))?;
                    }
                }
            }
            Event::ArtifactResolved {
                generation,
                kind,
                result,
            } => {
                self.report.apply(generation, kind, result);
            }
            Event::UITick => self.refresh_artifacts()?,
        }

        return Ok(false);
    }

    /// Re-resolves expired signed URLs of the panels currently on screen.
    fn refresh_artifacts(&mut self) -> Result<()> {
        if !self.store.state().report_visible {
            return Ok(());
        }

        for request in self.report.refresh_due(Utc::now()) {
            tracing::debug!(artifact = request.kind.field_name(), "Refreshing signed URL");
            self.action_tx.send(Action::ResolveArtifact(request))?;
        }

        return Ok(());
    }

    pub fn submit(&mut self, input: &str) -> Result<()> {
        let outcome = self.controller.submit(&mut self.store, input);
        return self.follow(outcome);
    }

    fn follow(&mut self, outcome: SubmitOutcome) -> Result<()> {
        if let SubmitOutcome::Dispatched(dispatch) = outcome {
            self.action_tx.send(Action::Submit(dispatch))?;
        }

        return Ok(());
    }

    /// Drops the last exchange. Not available while a request is in flight.
    pub fn undo(&mut self) {
        if self.controller.is_submitting() {
            return;
        }

        self.store.apply(|s| s.undo());
        self.report.clear();
        self.controller.acknowledge();
    }

    pub fn clear(&mut self) {
        self.controller.reset();
        self.store.clear();
        self.report.clear();
        self.selected_material = None;
        self.structure_error = None;
    }

    /// Attaches a file unless one with the same name is already present.
    pub fn attach(&mut self, file: AttachedFile) {
        let name = file.name.to_string();
        if let Err(err) = self.store.attach_file(file) {
            tracing::debug!(name = %name, error = %err, "Attachment skipped");
        }
    }

    pub fn remove_file(&mut self, name: &str) {
        self.store.apply(|s| s.remove_file(name));
        if self.selected_material.as_deref() == Some(name) {
            self.selected_material = None;
        }
    }

    /// Records the selection and starts the formula and spectrum lookups.
    pub fn select_material(&mut self, material_id: &str) -> Result<()> {
        let spectrum_id = self.catalog.primary_spectrum(material_id).map(str::to_string);
        if spectrum_id.is_none() {
            tracing::warn!(material_id = material_id, "No spectrum id in catalog");
        }

        self.selected_material = Some(material_id.to_string());
        let snapshot = self.store.apply(|s| {
            s.select_material(MaterialSelection::new(material_id, spectrum_id.as_deref()))
        });

        self.action_tx.send(Action::ResolveFormula {
            material_id: material_id.to_string(),
        })?;

        if let Some(spectrum_id) = spectrum_id {
            if !snapshot.attached_files.contains(material_id) {
                self.action_tx.send(Action::FetchSpectrum {
                    material_id: material_id.to_string(),
                    spectrum_id,
                    snapshot,
                })?;
            }
        }

        return Ok(());
    }

    pub fn search_structure(&mut self) -> Result<()> {
        let snapshot = self.store.snapshot();
        self.action_tx.send(Action::FetchStructure {
            formula: snapshot.formula_query.to_string(),
            snapshot,
        })?;

        return Ok(());
    }

    pub fn active_tab(&self) -> Tab {
        return self.store.state().active_tab;
    }
}
