use super::*;
use crate::{
    error::{FailureKind, DEFAULT_FAILURE_MESSAGE},
    ClientError,
};
use async_trait::async_trait;
use shared::protocol::{EngineParameters, FinalOutputs};
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::{broadcast::error::TryRecvError, Notify};

fn sample_result(rpm: f64) -> PredictionResult {
    PredictionResult {
        engine_parameters: EngineParameters {
            engine_rpm: rpm,
            intake_gas_mass_flow: 0.04,
            fuel_mass_flow: 0.003,
            air_fuel_ratio: 14.7,
        },
        final_outputs: FinalOutputs {
            engine_torque: 120.33,
            power_transferred: 40.0,
            efficiency: 0.31,
            bsfc: 265.0,
            power_from_fuel: 129.0,
        },
    }
}

struct ScriptedClient {
    outcomes: Mutex<VecDeque<Result<PredictionResult, ClientError>>>,
    inputs: Mutex<Vec<InputState>>,
}

impl ScriptedClient {
    fn new(outcomes: Vec<Result<PredictionResult, ClientError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    fn inputs(&self) -> Vec<InputState> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl PredictionClient for ScriptedClient {
    async fn predict(&self, input: InputState) -> Result<PredictionResult, ClientError> {
        self.inputs.lock().push(input);
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Transport("script exhausted".into())))
    }
}

/// Holds every exchange open until the test releases it.
struct GatedClient {
    started: Notify,
    release: Notify,
    calls: AtomicUsize,
    result: PredictionResult,
}

impl GatedClient {
    fn new(result: PredictionResult) -> Self {
        Self {
            started: Notify::new(),
            release: Notify::new(),
            calls: AtomicUsize::new(0),
            result,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionClient for GatedClient {
    async fn predict(&self, _input: InputState) -> Result<PredictionResult, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(self.result)
    }
}

#[test]
fn starts_idle() {
    let controller = SubmissionController::new(Arc::new(ScriptedClient::new(Vec::new())));
    assert_eq!(controller.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn successful_submission_ends_in_success() {
    let client = Arc::new(ScriptedClient::new(vec![Ok(sample_result(3200.5))]));
    let controller = SubmissionController::new(client.clone());

    let input = InputState::new(75.0, 2);
    let state = controller.submit(input).await;

    assert_eq!(state, SubmissionState::Success(sample_result(3200.5)));
    assert_eq!(controller.state(), state);
    assert_eq!(client.inputs(), vec![input]);
}

#[tokio::test]
async fn submit_current_reads_holder() {
    let client = Arc::new(ScriptedClient::new(vec![Ok(sample_result(900.0))]));
    let controller = SubmissionController::new(client.clone());
    let mut holder = InputStateHolder::default();
    holder.set_throttle(10.0);
    holder.set_gear(0);

    controller.submit_current(&holder).await;

    assert_eq!(client.inputs(), vec![InputState::new(10.0, 0)]);
}

#[tokio::test]
async fn emits_pending_then_outcome() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sample_result(1000.0)),
        Err(ClientError::HttpStatus(500)),
    ]));
    let controller = SubmissionController::new(client);
    let mut events = controller.subscribe();

    controller.submit(InputState::default()).await;
    controller.submit(InputState::default()).await;

    let first = events.try_recv().expect("pending event");
    assert_eq!(first.sequence, 1);
    assert_eq!(first.state, SubmissionState::Pending);
    let second = events.try_recv().expect("success event");
    assert_eq!(second.sequence, 1);
    assert!(second.state.result().is_some());

    let third = events.try_recv().expect("pending event");
    assert_eq!(third.sequence, 2);
    assert_eq!(third.state, SubmissionState::Pending);
    let fourth = events.try_recv().expect("failure event");
    assert_eq!(fourth.sequence, 2);
    assert_eq!(
        fourth.state.failure().map(SubmissionError::kind),
        Some(FailureKind::HttpStatus)
    );
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn failure_discards_previous_result() {
    let client = Arc::new(ScriptedClient::new(vec![
        Ok(sample_result(2000.0)),
        Err(ClientError::HttpStatus(500)),
    ]));
    let controller = SubmissionController::new(client);

    assert!(controller.submit(InputState::default()).await.result().is_some());
    let state = controller.submit(InputState::default()).await;

    assert!(state.result().is_none());
    let failure = state.failure().expect("failure");
    assert_eq!(failure.kind(), FailureKind::HttpStatus);
    assert!(!failure.message().is_empty());
    assert_eq!(controller.state(), state);
}

#[tokio::test]
async fn success_after_failure_clears_message() {
    let client = Arc::new(ScriptedClient::new(vec![
        Err(ClientError::Transport("connection refused".into())),
        Ok(sample_result(1500.0)),
    ]));
    let controller = SubmissionController::new(client);

    let failed = controller.submit(InputState::default()).await;
    assert_eq!(
        failed.failure().map(SubmissionError::kind),
        Some(FailureKind::Transport)
    );

    let recovered = controller.submit(InputState::default()).await;
    assert!(recovered.failure().is_none());
    assert_eq!(recovered.result().map(|r| r.engine_parameters.engine_rpm), Some(1500.0));
}

#[tokio::test]
async fn malformed_response_is_a_failure() {
    let client = Arc::new(ScriptedClient::new(vec![Err(ClientError::Malformed(
        "missing field `BSFC`".into(),
    ))]));
    let controller = SubmissionController::new(client);

    let state = controller.submit(InputState::default()).await;

    assert_eq!(
        state.failure().map(SubmissionError::kind),
        Some(FailureKind::Malformed)
    );
}

#[tokio::test]
async fn submit_while_pending_is_ignored() {
    let client = Arc::new(GatedClient::new(sample_result(3200.5)));
    let controller = Arc::new(SubmissionController::new(client.clone()));
    let mut events = controller.subscribe();

    let in_flight = tokio::spawn({
        let controller = controller.clone();
        async move { controller.submit(InputState::new(75.0, 2)).await }
    });
    client.started.notified().await;
    assert!(controller.state().is_pending());

    let ignored = controller.submit(InputState::new(10.0, 1)).await;
    assert_eq!(ignored, SubmissionState::Pending);
    assert_eq!(controller.state(), SubmissionState::Pending);
    assert_eq!(client.calls(), 1);

    client.release.notify_one();
    let state = in_flight.await.expect("join submission");
    assert_eq!(state, SubmissionState::Success(sample_result(3200.5)));
    assert_eq!(client.calls(), 1);

    let pending = events.try_recv().expect("pending event");
    assert_eq!(pending.input, InputState::new(75.0, 2));
    let done = events.try_recv().expect("outcome event");
    assert_eq!(done.sequence, pending.sequence);
    assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn never_retries_on_failure() {
    let client = Arc::new(ScriptedClient::new(vec![
        Err(ClientError::HttpStatus(503)),
        Ok(sample_result(1.0)),
    ]));
    let controller = SubmissionController::new(client.clone());

    controller.submit(InputState::default()).await;

    assert_eq!(client.inputs().len(), 1);
}

#[tokio::test]
async fn dropped_submit_does_not_wedge_pending() {
    let client = Arc::new(GatedClient::new(sample_result(2100.0)));
    let controller = SubmissionController::new(client.clone());
    let mut events = controller.subscribe();

    let timed_out = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        controller.submit(InputState::new(60.0, 4)),
    )
    .await;
    assert!(timed_out.is_err(), "gated exchange must not complete");

    let abandoned = controller.state();
    let failure = abandoned.failure().expect("abandoned submission settles as failure");
    assert_eq!(failure.kind(), FailureKind::Transport);
    assert_eq!(failure.message(), DEFAULT_FAILURE_MESSAGE);

    let pending = events.try_recv().expect("pending event");
    assert_eq!(pending.state, SubmissionState::Pending);
    let settled = events.try_recv().expect("abandon event");
    assert_eq!(settled.sequence, pending.sequence);
    assert_eq!(settled.state, abandoned);

    client.release.notify_one();
    let retried = controller.submit(InputState::new(60.0, 4)).await;
    assert_eq!(retried, SubmissionState::Success(sample_result(2100.0)));
    assert_eq!(client.calls(), 2);
}
