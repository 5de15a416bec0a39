use serde::{Deserialize, Serialize};

/// Error taxonomy of a verification attempt.
///
/// `Network`, `EngineFault` and `TokenMismatch` are the causes carried by a
/// failed session; `Validation` and `SessionBusy` reject an `initiate` call
/// before any session exists. Denials are outcomes, not errors; they travel
/// as `VerificationNotification::Denied`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum VerificationError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("a verification session is already in progress")]
    SessionBusy,

    #[error("network error: {0}")]
    Network(String),

    #[error("capture engine fault: {0}")]
    EngineFault(String),

    #[error("capture engine reported a token that does not belong to this session")]
    TokenMismatch,
}

impl VerificationError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::SessionBusy => "session_busy",
            Self::Network(_) => "network",
            Self::EngineFault(_) => "engine_fault",
            Self::TokenMismatch => "token_mismatch",
        }
    }
}
