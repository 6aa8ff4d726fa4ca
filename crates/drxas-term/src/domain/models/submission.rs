use std::fmt;
use std::time::Duration;

use drxas_types::ChatRequest;
use drxas_types::DrXasError;
use drxas_types::ResultEnvelope;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identity of one submission. Responses carrying another id are stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> RequestId {
        return RequestId(Uuid::new_v4());
    }
}

impl Default for RequestId {
    fn default() -> Self {
        return RequestId::new();
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}", self.0);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting {
        id: RequestId,
        message_index: usize,
    },
    Completed,
    Failed,
    Cancelled,
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        return matches!(
            self,
            SubmissionState::Completed | SubmissionState::Failed | SubmissionState::Cancelled
        );
    }
}

/// Everything a worker needs to issue one request.
#[derive(Clone, Debug)]
pub struct Dispatch {
    pub id: RequestId,
    pub request: ChatRequest,
    pub cancel: CancellationToken,
    pub timeout: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionOutcome {
    Completed(ResultEnvelope),
    Failed(DrXasError),
}
