use std::sync::Arc;

use drxas_types::ResultEnvelope;
use serde_json::json;

use super::*;
use crate::domain::models::PanelState;
use crate::domain::models::SpectrumContent;
use crate::test_support::ChatReply;
use crate::test_support::MockBackend;
use crate::test_support::MockStore;
use crate::test_support::NI_SPECTRUM;

fn props() -> AppStateProps {
    return AppStateProps {
        conversation_id: "123".to_string(),
        request_timeout: Duration::from_secs(5),
    };
}

#[tokio::test]
async fn it_renders_after_each_event_and_stops_on_quit() {
    let (action_tx, _action_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let mut app_state = AppState::new(props(), action_tx).unwrap();
    let mut events = EventsService::new(event_rx);

    event_tx.send(Event::InputChanged("Ni_foil".to_string())).unwrap();
    event_tx.send(Event::Quit).unwrap();
    event_tx.send(Event::InputChanged("ignored".to_string())).unwrap();

    let mut renders = 0;
    start_loop(&mut app_state, &mut events, |_| {
        renders += 1;
        return Ok(());
    })
    .await
    .unwrap();

    assert_eq!(renders, 3);
    assert_eq!(app_state.store.state().input, "Ni_foil");
}

#[tokio::test]
async fn it_stops_when_render_fails() {
    let (action_tx, _action_rx) = mpsc::unbounded_channel();
    let (_event_tx, event_rx) = mpsc::unbounded_channel();
    let mut app_state = AppState::new(props(), action_tx).unwrap();
    let mut events = EventsService::new(event_rx);

    let res = start_loop(&mut app_state, &mut events, |_| {
        anyhow::bail!("terminal gone");
    })
    .await;

    assert_eq!(res.unwrap_err().to_string(), "terminal gone");
}

#[tokio::test]
async fn it_runs_a_session_from_submit_to_rendered_spectrum() {
    let envelope = ResultEnvelope::from_value(json!({
        "messages": [["amp", 0.8]],
        "xas_url": "viz/Ni_foil.txt"
    }))
    .unwrap();
    let backend = MockBackend {
        healthy: true,
        ..Default::default()
    }
    .with_reply(ChatReply::Envelope(envelope));
    let storage = MockStore::default()
        .with_object(&MockStore::signed("viz/Ni_foil.txt"), NI_SPECTRUM.as_bytes());

    let session = Session::spawn(Arc::new(backend), Arc::new(storage), props())
        .unwrap()
        .with_tick(Duration::from_millis(10));
    let tx = session.sender();
    tx.send(Event::InputChanged("Ni_foil".to_string())).unwrap();
    tx.send(Event::Submit).unwrap();

    let mut quitting = false;
    let run = session.run(move |app| {
        let plotted = app
            .report
            .current()
            .map(|report| report.spectrum.ready().is_some())
            .unwrap_or(false);
        if plotted && !quitting {
            quitting = true;
            tx.send(Event::Quit)?;
        }
        return Ok(());
    });
    let app = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap();

    let report = app.report.current().unwrap();
    match &report.spectrum {
        PanelState::Ready(SpectrumContent::Plot(data)) => assert_eq!(data.len(), 4),
        other => panic!("expected a plot, got {other:?}"),
    }

    let state = app.store.state();
    assert_eq!(state.messages.len(), 2);
    assert!(!state.messages[1].is_provisional());
    assert!(!app.controller.is_submitting());
}
