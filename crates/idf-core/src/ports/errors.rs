use std::time::Duration;

use thiserror::Error;

/// Failure talking to the identity backend.
///
/// Distinct from a rejection: a backend that answers "no" returns `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureStartError {
    #[error("invalid streaming endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("capture engine unavailable: {0}")]
    Unavailable(String),
}
