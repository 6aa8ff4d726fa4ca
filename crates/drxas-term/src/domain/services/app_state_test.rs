use drxas_types::ArtifactKind;
use drxas_types::DrXasError;
use drxas_types::ResultEnvelope;
use serde_json::json;

use super::*;
use crate::domain::models::ArtifactRequest;
use crate::domain::models::Dispatch;
use crate::domain::models::FileOrigin;
use crate::domain::models::PanelKind;
use crate::domain::models::PanelState;
use crate::domain::models::SpectrumContent;
use crate::domain::models::SubmissionOutcome;
use crate::domain::models::SubmissionState;
use crate::domain::services::report::resolve_artifact;
use crate::domain::services::submission::CANCELLED_TEXT;
use crate::domain::services::submission::PROVISIONAL_TEXT;
use crate::test_support::MockStore;
use crate::test_support::NI_SPECTRUM;

fn app() -> (AppState, mpsc::UnboundedReceiver<Action>) {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel();
    let app = AppState::new(
        AppStateProps {
            conversation_id: "123".to_string(),
            request_timeout: Duration::from_secs(120),
        },
        action_tx,
    )
    .unwrap();

    assert!(matches!(action_rx.try_recv().unwrap(), Action::HealthCheck));
    assert!(matches!(action_rx.try_recv().unwrap(), Action::LoadCatalog));
    return (app, action_rx);
}

fn next_dispatch(rx: &mut mpsc::UnboundedReceiver<Action>) -> Dispatch {
    match rx.try_recv().unwrap() {
        Action::Submit(dispatch) => return dispatch,
        other => panic!("expected a submission, got {other:?}"),
    }
}

fn next_artifact(rx: &mut mpsc::UnboundedReceiver<Action>) -> ArtifactRequest {
    match rx.try_recv().unwrap() {
        Action::ResolveArtifact(request) => return request,
        other => panic!("expected an artifact request, got {other:?}"),
    }
}

fn catalog() -> Catalog {
    return serde_json::from_value(json!({
        "Ni_foil": ["ff693629", "Nickel"],
        "CuO": ["", "Copper oxide"]
    }))
    .unwrap();
}

#[tokio::test]
async fn it_runs_a_submission_through_to_the_report() {
    let (mut app, mut rx) = app();
    app.handle_event(Event::InputChanged("Ni_foil".to_string()))
        .unwrap();
    app.handle_event(Event::Submit).unwrap();

    let dispatch = next_dispatch(&mut rx);
    {
        let snapshot = app.store.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.messages[0].text(), "Ni_foil");
        assert_eq!(snapshot.messages[1].text(), PROVISIONAL_TEXT);
        assert_eq!(dispatch.request.message, "Ni_foil");
    }

    let envelope = ResultEnvelope::from_value(json!({
        "messages": [["amp", 0.8]],
        "xas_url": "viz/Ni_foil.txt",
        "material_url": "cif/does-not-exist.cif"
    }))
    .unwrap();
    app.handle_event(Event::SubmissionSettled {
        id: dispatch.id,
        outcome: SubmissionOutcome::Completed(envelope),
    })
    .unwrap();

    let snapshot = app.store.snapshot();
    assert_eq!(snapshot.messages.len(), 2);
    assert!(!snapshot.messages[1].is_provisional());
    assert_eq!(app.active_tab(), Tab::Report);
    assert_eq!(snapshot.input, "");

    let store = MockStore::default().with_object(
        &MockStore::signed("viz/Ni_foil.txt"),
        NI_SPECTRUM.as_bytes(),
    );
    for _ in 0..2 {
        let request = next_artifact(&mut rx);
        let result = resolve_artifact(&store, &request.locator).await;
        app.handle_event(Event::ArtifactResolved {
            generation: request.generation,
            kind: request.kind,
            result,
        })
        .unwrap();
    }

    let report = app.report.current().unwrap();
    assert!(matches!(
        report.spectrum,
        PanelState::Ready(SpectrumContent::Plot(_))
    ));
    assert!(report.structure.is_failed());
    assert_eq!(report.fitting, PanelState::Empty);
    assert!(report.artifact(ArtifactKind::Spectrum).is_some());
}

#[test]
fn it_ties_catalog_spectra_to_their_selection() {
    let (mut app, mut rx) = app();
    app.handle_event(Event::CatalogLoaded(catalog())).unwrap();
    app.handle_event(Event::SelectMaterial("Ni_foil".to_string()))
        .unwrap();

    assert!(matches!(
        rx.try_recv().unwrap(),
        Action::ResolveFormula { material_id } if material_id == "Ni_foil"
    ));
    let file = match rx.try_recv().unwrap() {
        Action::FetchSpectrum {
            material_id,
            spectrum_id,
            ..
        } => {
            assert_eq!(spectrum_id, "ff693629");
            AttachedFile::new(&material_id, b"8330 0.1\n", FileOrigin::SpectrumCatalog { spectrum_id })
        }
        other => panic!("unexpected action {other:?}"),
    };

    app.handle_event(Event::FormulaResolved {
        material_id: "Ni_foil".to_string(),
        formula: "Ni".to_string(),
    })
    .unwrap();
    app.handle_event(Event::SpectrumFetched {
        material_id: "Ni_foil".to_string(),
        result: Ok(Some(file)),
    })
    .unwrap();

    let state = app.store.snapshot();
    assert_eq!(state.formula_query, "Ni");
    assert_eq!(
        state.selection("Ni_foil").unwrap().chemical_formula.as_deref(),
        Some("Ni")
    );
    assert!(state.attached_files.contains("Ni_foil"));

    // Re-selecting does not fetch again.
    app.handle_event(Event::SelectMaterial("Ni_foil".to_string()))
        .unwrap();
    assert!(matches!(
        rx.try_recv().unwrap(),
        Action::ResolveFormula { .. }
    ));
    assert!(rx.try_recv().is_err());

    app.submit("fit").unwrap();
    let dispatch = next_dispatch(&mut rx);
    assert_eq!(dispatch.request.spectrum_ids, vec!["ff693629"]);
    assert_eq!(dispatch.request.files.len(), 1);
    app.handle_event(Event::SubmissionSettled {
        id: dispatch.id,
        outcome: SubmissionOutcome::Completed(ResultEnvelope::from_text("ok")),
    })
    .unwrap();

    app.handle_event(Event::RemoveFile("Ni_foil".to_string()))
        .unwrap();
    assert_eq!(app.selected_material, None);
    app.submit("fit again").unwrap();
    let dispatch = next_dispatch(&mut rx);
    assert!(dispatch.request.spectrum_ids.is_empty());
    assert!(dispatch.request.files.is_empty());
}

#[test]
fn it_discards_catalog_files_that_collide_with_attachments() {
    let (mut app, _rx) = app();
    app.handle_event(Event::CatalogLoaded(catalog())).unwrap();
    app.handle_event(Event::AttachFile {
        name: "Ni_foil".to_string(),
        bytes: b"mine".to_vec(),
        origin: FileOrigin::Upload,
    })
    .unwrap();
    app.handle_event(Event::SelectMaterial("Ni_foil".to_string()))
        .unwrap();

    app.handle_event(Event::SpectrumFetched {
        material_id: "Ni_foil".to_string(),
        result: Ok(Some(AttachedFile::new(
            "Ni_foil",
            b"theirs",
            FileOrigin::SpectrumCatalog {
                spectrum_id: "ff693629".to_string(),
            },
        ))),
    })
    .unwrap();

    let state = app.store.snapshot();
    assert_eq!(state.attached_files.len(), 1);
    assert_eq!(&*state.attached_files.get("Ni_foil").unwrap().bytes, b"mine");
}

#[test]
fn it_keeps_state_when_no_structure_exists() {
    let (mut app, mut rx) = app();
    app.handle_event(Event::FormulaChanged("CuO".to_string()))
        .unwrap();
    app.handle_event(Event::SearchStructure).unwrap();

    assert!(matches!(
        rx.try_recv().unwrap(),
        Action::FetchStructure { formula, .. } if formula == "CuO"
    ));
    let before = app.store.snapshot();

    app.handle_event(Event::StructureFetched {
        formula: "CuO".to_string(),
        result: Err(DrXasError::not_found("structure file for CuO")),
    })
    .unwrap();

    assert_eq!(app.store.snapshot(), before);
    assert_eq!(app.store.state().formula_query, "CuO");
    assert!(app.store.state().attached_files.is_empty());
    assert_eq!(app.store.state().error_banner, None);
    assert_eq!(
        app.structure_error.as_deref(),
        Some(STRUCTURE_NOT_FOUND_TEXT)
    );
}

#[test]
fn it_adds_found_structures_as_materials() {
    let (mut app, _rx) = app();
    app.handle_event(Event::StructureFetched {
        formula: "NiO".to_string(),
        result: Ok(Some(AttachedFile::new(
            "NiO.cif",
            b"data_NiO",
            FileOrigin::StructureDatabase {
                formula: "NiO".to_string(),
            },
        ))),
    })
    .unwrap();

    let state = app.store.snapshot();
    assert_eq!(state.materials, vec!["NiO"]);
    assert!(state.attached_files.contains("NiO.cif"));

    app.handle_event(Event::RemoveFile("NiO.cif".to_string()))
        .unwrap();
    assert!(app.store.state().materials.is_empty());
}

#[test]
fn it_blocks_undo_while_submitting() {
    let (mut app, mut rx) = app();
    app.submit("first").unwrap();
    let dispatch = next_dispatch(&mut rx);

    app.handle_event(Event::Undo).unwrap();
    assert_eq!(app.store.state().messages.len(), 2);

    app.handle_event(Event::SubmissionSettled {
        id: dispatch.id,
        outcome: SubmissionOutcome::Completed(ResultEnvelope::from_text("done")),
    })
    .unwrap();
    app.handle_event(Event::Undo).unwrap();
    assert!(app.store.state().messages.is_empty());
    assert!(app.report.current().is_none());
    assert_eq!(app.controller.state(), SubmissionState::Idle);
}

#[test]
fn it_stops_and_ignores_the_late_response() {
    let (mut app, mut rx) = app();
    app.handle_event(Event::InputChanged("Ni_foil".to_string()))
        .unwrap();
    app.handle_event(Event::Submit).unwrap();
    let first = next_dispatch(&mut rx);

    // Submitting again acts as the stop control.
    app.handle_event(Event::Submit).unwrap();
    assert!(first.cancel.is_cancelled());
    assert!(rx.try_recv().is_err());
    assert_eq!(app.store.state().messages[1].text(), CANCELLED_TEXT);

    app.handle_event(Event::SubmissionSettled {
        id: first.id,
        outcome: SubmissionOutcome::Completed(ResultEnvelope::from_text("late")),
    })
    .unwrap();
    assert_eq!(app.store.state().messages[1].text(), CANCELLED_TEXT);
    assert!(app.report.current().is_none());
    assert_eq!(app.store.state().input, "Ni_foil");
}

#[test]
fn it_clears_an_in_flight_session() {
    let (mut app, mut rx) = app();
    app.submit("first").unwrap();
    let dispatch = next_dispatch(&mut rx);

    app.handle_event(Event::Clear).unwrap();
    assert!(dispatch.cancel.is_cancelled());
    assert!(app.store.state().messages.is_empty());

    app.handle_event(Event::SubmissionSettled {
        id: dispatch.id,
        outcome: SubmissionOutcome::Completed(ResultEnvelope::from_text("late")),
    })
    .unwrap();
    assert!(app.store.state().messages.is_empty());
}

#[test]
fn it_retries_after_a_failure() {
    let (mut app, mut rx) = app();
    app.submit("fit Ni_foil").unwrap();
    let first = next_dispatch(&mut rx);

    app.handle_event(Event::SubmissionSettled {
        id: first.id,
        outcome: SubmissionOutcome::Failed(DrXasError::Timeout { seconds: 120 }),
    })
    .unwrap();
    assert!(app.store.state().error_banner.is_some());

    app.handle_event(Event::DismissBanner).unwrap();
    assert_eq!(app.store.state().error_banner, None);

    app.handle_event(Event::Retry).unwrap();
    let retry = next_dispatch(&mut rx);
    assert_eq!(retry.request, first.request);
    assert_ne!(retry.id, first.id);
}

#[test]
fn it_reports_an_unreachable_backend_in_history() {
    let (mut app, _rx) = app();
    app.handle_event(Event::BackendHealth(Err(DrXasError::network(
        "connection refused",
    ))))
    .unwrap();

    let state = app.store.snapshot();
    assert_eq!(state.messages.len(), 1);
    assert!(state.messages[0].is_error());
}

#[tokio::test]
async fn it_refreshes_expired_urls_on_tick() {
    let (mut app, mut rx) = app();
    app.submit("fit").unwrap();
    let dispatch = next_dispatch(&mut rx);
    app.handle_event(Event::SubmissionSettled {
        id: dispatch.id,
        outcome: SubmissionOutcome::Completed(
            ResultEnvelope::from_value(json!({"fitting_result_url": "fit/a.png"})).unwrap(),
        ),
    })
    .unwrap();

    let store = MockStore {
        ttl_secs: -10,
        ..Default::default()
    }
    .with_object(&MockStore::signed("fit/a.png"), b"\x89PNG");
    let request = next_artifact(&mut rx);
    let result = resolve_artifact(&store, &request.locator).await;
    app.handle_event(Event::ArtifactResolved {
        generation: request.generation,
        kind: request.kind,
        result,
    })
    .unwrap();

    app.handle_event(Event::UITick).unwrap();
    let refresh = next_artifact(&mut rx);
    assert_eq!(refresh.locator, "fit/a.png");

    // Hidden reports are not refreshed.
    app.handle_event(Event::HideReport).unwrap();
    app.handle_event(Event::UITick).unwrap();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn it_refreshes_expired_urls_when_a_panel_comes_back_into_view() {
    let (mut app, mut rx) = app();
    app.submit("fit").unwrap();
    let dispatch = next_dispatch(&mut rx);
    app.handle_event(Event::SubmissionSettled {
        id: dispatch.id,
        outcome: SubmissionOutcome::Completed(
            ResultEnvelope::from_value(json!({"fitting_result_url": "fit/a.png"})).unwrap(),
        ),
    })
    .unwrap();

    let store = MockStore {
        ttl_secs: -10,
        ..Default::default()
    }
    .with_object(&MockStore::signed("fit/a.png"), b"\x89PNG");
    let request = next_artifact(&mut rx);
    app.handle_event(Event::HideReport).unwrap();
    let result = resolve_artifact(&store, &request.locator).await;
    app.handle_event(Event::ArtifactResolved {
        generation: request.generation,
        kind: request.kind,
        result,
    })
    .unwrap();

    app.handle_event(Event::UITick).unwrap();
    assert!(rx.try_recv().is_err());

    app.handle_event(Event::ShowReport).unwrap();
    let refresh = next_artifact(&mut rx);
    assert_eq!(refresh.kind, ArtifactKind::Fitting);

    // The refreshed URL expired again while the panel was collapsed.
    app.handle_event(Event::TogglePanel(PanelKind::Fitting))
        .unwrap();
    let result = resolve_artifact(&store, &refresh.locator).await;
    app.handle_event(Event::ArtifactResolved {
        generation: refresh.generation,
        kind: refresh.kind,
        result,
    })
    .unwrap();
    app.handle_event(Event::UITick).unwrap();
    assert!(rx.try_recv().is_err());

    app.handle_event(Event::TogglePanel(PanelKind::Fitting))
        .unwrap();
    assert_eq!(next_artifact(&mut rx).locator, "fit/a.png");
}

#[test]
fn it_stops_on_quit() {
    let (mut app, _rx) = app();
    assert!(!app.handle_event(Event::UITick).unwrap());
    assert!(app.handle_event(Event::Quit).unwrap());
}
