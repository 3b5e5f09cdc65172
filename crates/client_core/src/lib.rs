use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::ServiceErrorBody,
    protocol::{PredictRequest, PREDICT_PATH},
};
use tracing::{debug, warn};
use url::Url;

pub mod controller;
pub mod error;
pub mod input;
pub mod presenter;

pub use controller::{SubmissionController, SubmissionEvent, SubmissionState};
pub use error::{ClientError, FailureKind, SubmissionError};
pub use input::InputStateHolder;
pub use presenter::{present, PredictionDisplay};
pub use shared::{domain::InputState, protocol::PredictionResult};

/// One request/response exchange with the engine-performance inference service.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, input: InputState) -> Result<PredictionResult, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub service_url: String,
    pub request_timeout: Option<Duration>,
}

impl ClientOptions {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            request_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

pub struct HttpPredictionClient {
    http: Client,
    endpoint: Url,
}

impl HttpPredictionClient {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        let endpoint = predict_endpoint(&options.service_url)?;
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, input: InputState) -> Result<PredictionResult, ClientError> {
        let request = PredictRequest::from(input);
        debug!(
            endpoint = %self.endpoint,
            throttle_pos = request.throttle_pos,
            gear = request.gear,
            "dispatching prediction request"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .ok()
                .and_then(|body| ServiceErrorBody::parse(&body));
            match detail {
                Some(detail) => warn!(
                    status = status.as_u16(),
                    detail = %detail.error,
                    "inference service reported failure"
                ),
                None => warn!(status = status.as_u16(), "inference service reported failure"),
            }
            return Err(ClientError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| ClientError::Transport(err.to_string()))?;
        serde_json::from_slice::<PredictionResult>(&body)
            .map_err(|err| ClientError::Malformed(err.to_string()))
    }
}

/// Resolves the prediction endpoint from a service base url. A url that
/// already names the endpoint is used unchanged.
pub fn predict_endpoint(service_url: &str) -> Result<Url, ClientError> {
    let service_url = service_url.trim();
    let base = Url::parse(service_url)
        .map_err(|err| ClientError::InvalidEndpoint(format!("{service_url}: {err}")))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(ClientError::InvalidEndpoint(format!(
            "{service_url}: unsupported scheme '{}'",
            base.scheme()
        )));
    }

    if base.path().trim_end_matches('/').ends_with(PREDICT_PATH) {
        return Ok(base);
    }

    let joined = format!("{}{PREDICT_PATH}", base.as_str().trim_end_matches('/'));
    Url::parse(&joined).map_err(|err| ClientError::InvalidEndpoint(format!("{joined}: {err}")))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
