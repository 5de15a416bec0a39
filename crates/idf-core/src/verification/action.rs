use crate::ids::{AttemptId, SessionToken, SubjectId};

use super::VerificationNotification;

/// Side effects requested by the state machine, executed by the orchestrator
/// in order.
#[derive(Clone, Debug, PartialEq)]
pub enum VerificationAction {
    // backend
    RequestToken {
        attempt_id: AttemptId,
        subject: SubjectId,
    },
    Validate {
        attempt_id: AttemptId,
        subject: SubjectId,
        token: SessionToken,
    },

    // capture engine
    StartCapture {
        attempt_id: AttemptId,
        token: SessionToken,
    },
    CloseCapture,

    // caller
    Notify(VerificationNotification),

    // housekeeping: feed `Reset` back into the machine
    ResetSession,
}
