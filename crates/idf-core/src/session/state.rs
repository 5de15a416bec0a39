use crate::ids::{AttemptId, SessionToken, SubjectId};
use crate::verification::{DenyReason, VerificationError};

use super::SessionPhase;

/// Current session identity: subject, token and phase.
///
/// The token only exists while the capture engine or the backend validation
/// may still refer to it. Terminal variants keep the subject and outcome until
/// the orchestrator resets back to `Idle`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Idle,

    RequestingToken {
        attempt_id: AttemptId,
        subject: SubjectId,
    },

    // capture engine running with the issued token
    EngineActive {
        attempt_id: AttemptId,
        subject: SubjectId,
        token: SessionToken,
    },

    // engine reported success for the current token, backend confirmation pending
    Validating {
        attempt_id: AttemptId,
        subject: SubjectId,
        token: SessionToken,
    },

    Granted {
        attempt_id: AttemptId,
        subject: SubjectId,
    },

    Denied {
        attempt_id: AttemptId,
        subject: SubjectId,
        reason: DenyReason,
    },

    Failed {
        attempt_id: AttemptId,
        subject: SubjectId,
        error: VerificationError,
    },
}

impl SessionState {
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Idle => SessionPhase::Idle,
            Self::RequestingToken { .. } => SessionPhase::RequestingToken,
            Self::EngineActive { .. } => SessionPhase::EngineActive,
            Self::Validating { .. } => SessionPhase::Validating,
            Self::Granted { .. } => SessionPhase::Granted,
            Self::Denied { .. } => SessionPhase::Denied,
            Self::Failed { .. } => SessionPhase::Error,
        }
    }

    pub fn attempt_id(&self) -> Option<&AttemptId> {
        match self {
            Self::Idle => None,
            Self::RequestingToken { attempt_id, .. }
            | Self::EngineActive { attempt_id, .. }
            | Self::Validating { attempt_id, .. }
            | Self::Granted { attempt_id, .. }
            | Self::Denied { attempt_id, .. }
            | Self::Failed { attempt_id, .. } => Some(attempt_id),
        }
    }

    pub fn subject(&self) -> Option<&SubjectId> {
        match self {
            Self::Idle => None,
            Self::RequestingToken { subject, .. }
            | Self::EngineActive { subject, .. }
            | Self::Validating { subject, .. }
            | Self::Granted { subject, .. }
            | Self::Denied { subject, .. }
            | Self::Failed { subject, .. } => Some(subject),
        }
    }

    /// The active token; `None` means no active session.
    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            Self::EngineActive { token, .. } | Self::Validating { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_current(&self, attempt_id: &AttemptId) -> bool {
        self.attempt_id() == Some(attempt_id)
    }
}
