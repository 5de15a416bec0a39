use serde::Serialize;

use crate::ids::{AttemptId, SubjectId};

use super::{DenyReason, VerificationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetReason {
    /// Automatic reset after a terminal outcome was reported.
    Completed,
    /// Caller abandoned the attempt.
    Abandoned,
}

/// Caller-facing notifications, delivered in order on one channel per subscriber.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VerificationNotification {
    Progress {
        attempt_id: AttemptId,
        progress: f32,
        message: String,
    },
    Granted {
        attempt_id: AttemptId,
        subject: SubjectId,
    },
    Denied {
        attempt_id: AttemptId,
        reason: DenyReason,
    },
    /// Network failure, engine fault or token mismatch.
    Failed {
        attempt_id: AttemptId,
        error: VerificationError,
    },
    SessionBusy,
    ValidationError {
        detail: String,
    },
    SessionReset {
        attempt_id: AttemptId,
        reason: ResetReason,
    },
}

impl VerificationNotification {
    /// Outcomes that end an attempt.
    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            Self::Granted { .. } | Self::Denied { .. } | Self::Failed { .. }
        )
    }
}
