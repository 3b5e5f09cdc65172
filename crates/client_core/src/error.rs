//! Failure taxonomy for the prediction exchange and its user-facing summary.

use thiserror::Error;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Failed to get predictions";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("prediction exchange failed: {0}")]
    Transport(String),
    #[error("prediction service responded with HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed prediction response: {0}")]
    Malformed(String),
    #[error("invalid prediction service url: {0}")]
    InvalidEndpoint(String),
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::InvalidEndpoint(_) => FailureKind::Transport,
            Self::HttpStatus(_) => FailureKind::HttpStatus,
            Self::Malformed(_) => FailureKind::Malformed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    HttpStatus,
    Malformed,
}

/// Short description of a failed submission, suitable for showing to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionError {
    kind: FailureKind,
    message: String,
}

impl SubmissionError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            DEFAULT_FAILURE_MESSAGE.to_string()
        } else {
            message
        };
        Self { kind, message }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&ClientError> for SubmissionError {
    fn from(value: &ClientError) -> Self {
        let message = match value {
            ClientError::Transport(_) | ClientError::InvalidEndpoint(_) => {
                "Prediction service unreachable; check the service URL and retry.".to_string()
            }
            ClientError::HttpStatus(code) => format!("{DEFAULT_FAILURE_MESSAGE} (HTTP {code})"),
            ClientError::Malformed(_) => {
                "Prediction service returned an unexpected response.".to_string()
            }
        };
        Self::new(value.kind(), message)
    }
}

impl std::fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
