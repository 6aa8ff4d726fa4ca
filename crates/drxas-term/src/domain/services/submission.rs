#[cfg(test)]
#[path = "submission_test.rs"]
mod tests;

use std::time::Duration;

use drxas_client::is_network_locator;
use drxas_client::BackendClient;
use drxas_types::ArtifactKind;
use drxas_types::ChatRequest;
use drxas_types::DrXasError;
use drxas_types::ResultEnvelope;
use tokio_util::sync::CancellationToken;

use super::SessionStore;
use crate::domain::models::Dispatch;
use crate::domain::models::Message;
use crate::domain::models::MessagePart;
use crate::domain::models::MessagePatch;
use crate::domain::models::MessageType;
use crate::domain::models::RequestId;
use crate::domain::models::Role;
use crate::domain::models::SubmissionOutcome;
use crate::domain::models::SubmissionState;
use crate::domain::models::Tab;

pub const PROVISIONAL_TEXT: &str = "⏳ Please wait while I process your query...";
pub const TIMEOUT_TEXT: &str = "Request timed out. Please try again.";
pub const CANCELLED_TEXT: &str = "Request cancelled.";

/// What a call to `submit` or `retry` did.
#[derive(Debug)]
pub enum SubmitOutcome {
    Ignored,
    /// The call acted as the stop control for the request in flight.
    Cancelled(RequestId),
    Dispatched(Dispatch),
}

struct InFlight {
    id: RequestId,
    message_index: usize,
    cancel: CancellationToken,
}

/// Single-flight submit, cancel and timeout state machine.
pub struct SubmissionController {
    conversation_id: String,
    timeout: Duration,
    state: SubmissionState,
    in_flight: Option<InFlight>,
    last_request: Option<ChatRequest>,
}

impl SubmissionController {
    pub fn new(conversation_id: &str, timeout: Duration) -> SubmissionController {
        return SubmissionController {
            conversation_id: conversation_id.to_string(),
            timeout,
            state: SubmissionState::Idle,
            in_flight: None,
            last_request: None,
        };
    }

    pub fn state(&self) -> SubmissionState {
        return self.state;
    }

    pub fn is_submitting(&self) -> bool {
        return self.in_flight.is_some();
    }

    pub fn current_id(&self) -> Option<RequestId> {
        return self.in_flight.as_ref().map(|f| f.id);
    }

    pub fn last_request(&self) -> Option<&ChatRequest> {
        return self.last_request.as_ref();
    }

    pub fn submit(&mut self, store: &mut SessionStore, input: &str) -> SubmitOutcome {
        if let Some(id) = self.cancel(store) {
            return SubmitOutcome::Cancelled(id);
        }

        if input.trim().is_empty() {
            tracing::debug!(error = %DrXasError::validation("input is blank"), "Submission ignored");
            return SubmitOutcome::Ignored;
        }

        let request = store.state().compose_request(&self.conversation_id, input);
        return self.dispatch(store, request);
    }

    /// Resends the last composed request under a fresh identity.
    pub fn retry(&mut self, store: &mut SessionStore) -> SubmitOutcome {
        if self.is_submitting() {
            return SubmitOutcome::Ignored;
        }

        match self.last_request.clone() {
            Some(request) => return self.dispatch(store, request),
            None => return SubmitOutcome::Ignored,
        }
    }

    fn dispatch(&mut self, store: &mut SessionStore, request: ChatRequest) -> SubmitOutcome {
        store.append_message(Message::new(Role::User, &request.message));
        let message_index = store.append_message(Message::new_with_type(
            Role::Assistant,
            MessageType::Provisional,
            PROVISIONAL_TEXT,
        ));
        store.apply(|s| s.set_pending(true).dismiss_banner());

        let id = RequestId::new();
        let cancel = CancellationToken::new();
        self.in_flight = Some(InFlight {
            id,
            message_index,
            cancel: cancel.clone(),
        });
        self.state = SubmissionState::Submitting { id, message_index };
        self.last_request = Some(request.clone());

        tracing::info!(
            request_id = %id,
            materials = request.materials.len(),
            spectra = request.spectrum_ids.len(),
            files = request.files.len(),
            "Submitting analysis request"
        );

        return SubmitOutcome::Dispatched(Dispatch {
            id,
            request,
            cancel,
            timeout: self.timeout,
        });
    }

    /// Aborts the request in flight, if any, and returns its identity.
    pub fn cancel(&mut self, store: &mut SessionStore) -> Option<RequestId> {
        let in_flight = self.in_flight.take()?;
        in_flight.cancel.cancel();

        store.update_message(in_flight.message_index, &MessagePatch::error(CANCELLED_TEXT));
        store.apply(|s| s.set_pending(false));
        self.state = SubmissionState::Cancelled;

        tracing::info!(request_id = %in_flight.id, "Submission cancelled");
        return Some(in_flight.id);
    }

    /// Applies a worker result. Returns the envelope to render when the
    /// request completed and was still current.
    pub fn settle(
        &mut self,
        store: &mut SessionStore,
        id: RequestId,
        outcome: SubmissionOutcome,
    ) -> Option<ResultEnvelope> {
        if self.current_id() != Some(id) {
            tracing::debug!(request_id = %id, "Discarding stale response");
            return None;
        }
        let in_flight = self.in_flight.take()?;

        match outcome {
            SubmissionOutcome::Completed(envelope) => {
                store.update_message(
                    in_flight.message_index,
                    &MessagePatch {
                        role: Some(Role::Assistant),
                        content: Some(envelope_content(&envelope)),
                        message_type: Some(MessageType::Normal),
                    },
                );
                store.apply(|s| {
                    s.set_pending(false)
                        .set_input("")
                        .show_report()
                        .set_active_tab(Tab::Report)
                });
                self.state = SubmissionState::Completed;

                tracing::info!(request_id = %id, "Submission completed");
                return Some(envelope);
            }
            SubmissionOutcome::Failed(DrXasError::Cancelled) => {
                store.update_message(in_flight.message_index, &MessagePatch::error(CANCELLED_TEXT));
                store.apply(|s| s.set_pending(false));
                self.state = SubmissionState::Cancelled;
                return None;
            }
            SubmissionOutcome::Failed(err) => {
                let (message, banner) = failure_text(&err);
                store.update_message(in_flight.message_index, &MessagePatch::error(&message));
                store.apply(|s| s.set_pending(false).set_banner(&banner));
                self.state = SubmissionState::Failed;

                tracing::error!(request_id = %id, error = %err, "Submission failed");
                return None;
            }
        }
    }

    /// Returns a finished submission to `Idle`.
    pub fn acknowledge(&mut self) {
        if self.state.is_terminal() {
            self.state = SubmissionState::Idle;
        }
    }

    /// Forgets everything, aborting any request in flight.
    pub fn reset(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.cancel.cancel();
        }
        self.state = SubmissionState::Idle;
        self.last_request = None;
    }
}

/// History text and banner text for a failed request.
fn failure_text(err: &DrXasError) -> (String, String) {
    match err {
        DrXasError::Timeout { .. } => return (TIMEOUT_TEXT.to_string(), TIMEOUT_TEXT.to_string()),
        DrXasError::Network { message } => return (format!("Error: {message}"), message.to_string()),
        other => return (format!("Error: {other}"), other.to_string()),
    }
}

/// Message parts shown in history for a completed result.
pub fn envelope_content(envelope: &ResultEnvelope) -> Vec<MessagePart> {
    let mut text = envelope.messages.text();
    if let Some(rows) = envelope.messages.rows() {
        text = rows
            .iter()
            .map(|row| row.join(": "))
            .collect::<Vec<String>>()
            .join("\n");
    }
    if let Some(headline) = envelope.headline() {
        text = if text.trim().is_empty() {
            headline.to_string()
        } else {
            format!("{headline}\n\n{text}")
        };
    }

    // Storage keys are not fetchable as-is, so only full URLs become images.
    let mut parts = MessagePart::parse(&text);
    let mut keys: Vec<String> = vec![];
    for kind in [ArtifactKind::Spectrum, ArtifactKind::Fitting] {
        match envelope.artifact(kind) {
            Some(source) if is_network_locator(source) => parts.push(MessagePart::Image {
                source: source.to_string(),
            }),
            Some(source) => keys.push(format!("{} (storage key): {source}", kind.field_name())),
            None => {}
        }
    }
    if !keys.is_empty() {
        parts.push(MessagePart::Text { text: keys.join("\n") });
    }

    return parts;
}

/// Issues one request, racing it against cancellation and the timeout.
pub async fn run_submission(backend: &dyn BackendClient, dispatch: Dispatch) -> SubmissionOutcome {
    let Dispatch {
        id,
        request,
        cancel,
        timeout,
    } = dispatch;

    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(request_id = %id, "Request aborted");
            return SubmissionOutcome::Failed(DrXasError::Cancelled);
        }
        result = tokio::time::timeout(timeout, backend.chat(request)) => match result {
            Ok(Ok(envelope)) => return SubmissionOutcome::Completed(envelope),
            Ok(Err(err)) => return SubmissionOutcome::Failed(err),
            Err(_) => {
                tracing::warn!(request_id = %id, seconds = timeout.as_secs(), "Request timed out");
                return SubmissionOutcome::Failed(DrXasError::Timeout {
                    seconds: timeout.as_secs(),
                });
            }
        }
    }
}
