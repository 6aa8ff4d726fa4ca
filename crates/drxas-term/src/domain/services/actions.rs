use std::sync::Arc;

use anyhow::Result;
use drxas_client::BackendClient;
use drxas_client::ObjectStore;
use tokio::sync::mpsc;

use super::report::resolve_artifact;
use super::submission::run_submission;
use super::MaterialResolver;
use crate::domain::models::Action;
use crate::domain::models::Event;

/// Runs every action on its own worker task and reports back as events.
pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        backend: Arc<dyn BackendClient>,
        storage: Arc<dyn ObjectStore>,
        event_tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let resolver = Arc::new(MaterialResolver::new(backend.clone()));

        while let Some(action) = rx.recv().await {
            let worker_event_tx = event_tx.clone();
            match action {
                Action::HealthCheck => {
                    let backend = backend.clone();
                    tokio::spawn(async move {
                        let result = backend.health_check().await;
                        worker_event_tx.send(Event::BackendHealth(result))?;
                        return Ok::<(), anyhow::Error>(());
                    });
                }
                Action::LoadCatalog => {
                    let resolver = resolver.clone();
                    tokio::spawn(async move {
                        let catalog = resolver.list_catalog().await;
                        worker_event_tx.send(Event::CatalogLoaded(catalog))?;
                        return Ok::<(), anyhow::Error>(());
                    });
                }
                Action::ResolveFormula { material_id } => {
                    let resolver = resolver.clone();
                    tokio::spawn(async move {
                        let formula = resolver.resolve_formula(&material_id).await;
                        worker_event_tx.send(Event::FormulaResolved {
                            material_id,
                            formula,
                        })?;
                        return Ok::<(), anyhow::Error>(());
                    });
                }
                Action::FetchSpectrum {
                    material_id,
                    spectrum_id,
                    snapshot,
                } => {
                    let resolver = resolver.clone();
                    tokio::spawn(async move {
                        let result = resolver
                            .fetch_spectrum_payload(
                                &spectrum_id,
                                &material_id,
                                &snapshot.attached_files,
                            )
                            .await;
                        worker_event_tx.send(Event::SpectrumFetched {
                            material_id,
                            result,
                        })?;
                        return Ok::<(), anyhow::Error>(());
                    });
                }
                Action::FetchStructure { formula, snapshot } => {
                    let resolver = resolver.clone();
                    tokio::spawn(async move {
                        let result = resolver
                            .fetch_structure_by_formula(&formula, &snapshot.attached_files)
                            .await;
                        worker_event_tx.send(Event::StructureFetched { formula, result })?;
                        return Ok::<(), anyhow::Error>(());
                    });
                }
                Action::Submit(dispatch) => {
                    let backend = backend.clone();
                    tokio::spawn(async move {
                        let id = dispatch.id;
                        let outcome = run_submission(backend.as_ref(), dispatch).await;
                        worker_event_tx.send(Event::SubmissionSettled { id, outcome })?;
                        return Ok::<(), anyhow::Error>(());
                    });
                }
                Action::ResolveArtifact(request) => {
                    let storage = storage.clone();
                    tokio::spawn(async move {
                        let result = resolve_artifact(storage.as_ref(), &request.locator).await;
                        worker_event_tx.send(Event::ArtifactResolved {
                            generation: request.generation,
                            kind: request.kind,
                            result,
                        })?;
                        return Ok::<(), anyhow::Error>(());
                    });
                }
            }
        }

        return Ok(());
    }
}
