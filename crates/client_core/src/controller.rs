//! Submission lifecycle: single-flight orchestration of prediction requests.

use std::sync::Arc;

use parking_lot::Mutex;
use shared::{domain::InputState, protocol::PredictionResult};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::{FailureKind, SubmissionError, DEFAULT_FAILURE_MESSAGE},
    input::InputStateHolder,
    PredictionClient,
};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending,
    Success(PredictionResult),
    Failure(SubmissionError),
}

impl SubmissionState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        match self {
            Self::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&SubmissionError> {
        match self {
            Self::Failure(err) => Some(err),
            _ => None,
        }
    }
}

/// Broadcast on every state transition. `sequence` identifies the submission
/// the transition belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionEvent {
    pub sequence: u64,
    pub input: InputState,
    pub state: SubmissionState,
}

struct ControllerState {
    current: SubmissionState,
    sequence: u64,
}

pub struct SubmissionController {
    client: Arc<dyn PredictionClient>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<SubmissionEvent>,
}

impl SubmissionController {
    pub fn new(client: Arc<dyn PredictionClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            inner: Mutex::new(ControllerState {
                current: SubmissionState::Idle,
                sequence: 0,
            }),
            events,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.inner.lock().current.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    pub async fn submit_current(&self, holder: &InputStateHolder) -> SubmissionState {
        self.submit(holder.current()).await
    }

    /// Runs one prediction exchange for `input` and returns the resulting state.
    ///
    /// While a submission is pending, further calls return `Pending` without
    /// touching the state or contacting the service.
    pub async fn submit(&self, input: InputState) -> SubmissionState {
        let sequence = {
            let mut inner = self.inner.lock();
            if inner.current.is_pending() {
                debug!(
                    sequence = inner.sequence,
                    "prediction already in flight; ignoring submit"
                );
                return SubmissionState::Pending;
            }
            inner.sequence += 1;
            inner.current = SubmissionState::Pending;
            self.emit(inner.sequence, input, SubmissionState::Pending);
            inner.sequence
        };
        let pending = PendingSubmission {
            controller: self,
            sequence,
            input,
            settled: false,
        };

        info!(
            sequence,
            throttle_pos = input.throttle_position(),
            gear = input.gear(),
            "requesting engine prediction"
        );

        let next = match self.client.predict(input).await {
            Ok(result) => {
                info!(
                    sequence,
                    engine_rpm = result.engine_parameters.engine_rpm,
                    engine_torque = result.final_outputs.engine_torque,
                    "prediction received"
                );
                SubmissionState::Success(result)
            }
            Err(err) => {
                warn!(sequence, error = %err, "prediction failed");
                SubmissionState::Failure(SubmissionError::from(&err))
            }
        };

        pending.settle(next)
    }

    fn settle(&self, sequence: u64, input: InputState, next: SubmissionState) {
        let mut inner = self.inner.lock();
        inner.current = next.clone();
        self.emit(sequence, input, next);
    }

    fn emit(&self, sequence: u64, input: InputState, state: SubmissionState) {
        // Send only fails when nobody is subscribed.
        let _ = self.events.send(SubmissionEvent {
            sequence,
            input,
            state,
        });
    }
}

/// Moves the controller off `Pending` even when the `submit` future is
/// dropped before the exchange resolves.
struct PendingSubmission<'a> {
    controller: &'a SubmissionController,
    sequence: u64,
    input: InputState,
    settled: bool,
}

impl PendingSubmission<'_> {
    fn settle(mut self, next: SubmissionState) -> SubmissionState {
        self.settled = true;
        self.controller.settle(self.sequence, self.input, next.clone());
        next
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        warn!(sequence = self.sequence, "prediction abandoned before completion");
        self.controller.settle(
            self.sequence,
            self.input,
            SubmissionState::Failure(SubmissionError::new(
                FailureKind::Transport,
                DEFAULT_FAILURE_MESSAGE,
            )),
        );
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
