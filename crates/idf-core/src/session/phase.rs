use serde::{Deserialize, Serialize};

/// Lifecycle phase of one verification attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    RequestingToken,
    EngineActive,
    Validating,
    Granted,
    Denied,
    Error,
}

impl SessionPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Granted | Self::Denied | Self::Error)
    }

    /// Phases an `abandon` can interrupt.
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            Self::RequestingToken | Self::EngineActive | Self::Validating
        )
    }
}
