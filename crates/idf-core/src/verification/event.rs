use crate::capture::CaptureEvent;
use crate::ids::{AttemptId, SessionToken, SubjectId};

/// Inputs to the verification state machine.
///
/// Everything except `Abandon` and `Reset` carries the attempt it belongs to;
/// the state machine drops events whose attempt is no longer current.
#[derive(Clone, Debug, PartialEq)]
pub enum VerificationEvent {
    // caller
    Initiate {
        attempt_id: AttemptId,
        subject: SubjectId,
    },
    Abandon,

    // backend: token acquisition
    TokenIssued {
        attempt_id: AttemptId,
        token: SessionToken,
    },
    TokenRejected {
        attempt_id: AttemptId,
        message: Option<String>,
    },
    TokenRequestFailed {
        attempt_id: AttemptId,
        cause: String,
    },

    // capture engine
    CaptureStartFailed {
        attempt_id: AttemptId,
        cause: String,
    },
    Capture {
        attempt_id: AttemptId,
        event: CaptureEvent,
    },
    CaptureStreamClosed {
        attempt_id: AttemptId,
    },
    CaptureIdleTimeout {
        attempt_id: AttemptId,
    },

    // backend: result validation
    ValidationCompleted {
        attempt_id: AttemptId,
        passed: bool,
    },
    ValidationFailed {
        attempt_id: AttemptId,
        cause: String,
    },

    // self-triggered after a terminal outcome has been reported
    Reset,
}

impl VerificationEvent {
    pub fn attempt_id(&self) -> Option<&AttemptId> {
        match self {
            Self::Abandon | Self::Reset => None,
            Self::Initiate { attempt_id, .. }
            | Self::TokenIssued { attempt_id, .. }
            | Self::TokenRejected { attempt_id, .. }
            | Self::TokenRequestFailed { attempt_id, .. }
            | Self::CaptureStartFailed { attempt_id, .. }
            | Self::Capture { attempt_id, .. }
            | Self::CaptureStreamClosed { attempt_id }
            | Self::CaptureIdleTimeout { attempt_id }
            | Self::ValidationCompleted { attempt_id, .. }
            | Self::ValidationFailed { attempt_id, .. } => Some(attempt_id),
        }
    }

    /// Short label for spans and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initiate { .. } => "initiate",
            Self::Abandon => "abandon",
            Self::TokenIssued { .. } => "token_issued",
            Self::TokenRejected { .. } => "token_rejected",
            Self::TokenRequestFailed { .. } => "token_request_failed",
            Self::CaptureStartFailed { .. } => "capture_start_failed",
            Self::Capture { event, .. } => match event {
                CaptureEvent::Processing { .. } => "capture_processing",
                CaptureEvent::Success { .. } => "capture_success",
                CaptureEvent::Failure { .. } => "capture_failure",
                CaptureEvent::Error { .. } => "capture_error",
            },
            Self::CaptureStreamClosed { .. } => "capture_stream_closed",
            Self::CaptureIdleTimeout { .. } => "capture_idle_timeout",
            Self::ValidationCompleted { .. } => "validation_completed",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::Reset => "reset",
        }
    }
}
