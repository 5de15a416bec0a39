use tracing::{debug, warn};

use crate::capture::CaptureEvent;
use crate::ids::{AttemptId, SubjectId};
use crate::session::SessionState;
use crate::verification::action::VerificationAction;
use crate::verification::event::VerificationEvent;
use crate::verification::notification::{ResetReason, VerificationNotification};
use crate::verification::{DenyReason, VerificationError};

const CAPTURE_STREAM_CLOSED: &str = "capture stream closed";
const CAPTURE_IDLE_TIMEOUT: &str = "capture stream idle timeout";

pub struct VerificationStateMachine;

impl VerificationStateMachine {
    pub fn transition(
        state: SessionState,
        event: VerificationEvent,
    ) -> (SessionState, Vec<VerificationAction>) {
        // ===== Stale =====
        if !matches!(event, VerificationEvent::Initiate { .. }) {
            if let Some(event_attempt) = event.attempt_id() {
                if !state.is_current(event_attempt) {
                    debug!(
                        event = event.name(),
                        attempt_id = %event_attempt,
                        phase = ?state.phase(),
                        "dropping event for a stale attempt"
                    );
                    return (state, vec![]);
                }
            }
        }

        match (state, event) {
            // ===== Start =====
            (SessionState::Idle, VerificationEvent::Initiate { attempt_id, subject }) => (
                SessionState::RequestingToken {
                    attempt_id: attempt_id.clone(),
                    subject: subject.clone(),
                },
                vec![VerificationAction::RequestToken {
                    attempt_id,
                    subject,
                }],
            ),
            (state, VerificationEvent::Initiate { .. }) => (
                state,
                vec![VerificationAction::Notify(
                    VerificationNotification::SessionBusy,
                )],
            ),

            // ===== Token =====
            (
                SessionState::RequestingToken {
                    attempt_id,
                    subject,
                },
                VerificationEvent::TokenIssued { token, .. },
            ) => (
                SessionState::EngineActive {
                    attempt_id: attempt_id.clone(),
                    subject,
                    token: token.clone(),
                },
                vec![VerificationAction::StartCapture { attempt_id, token }],
            ),
            (
                SessionState::RequestingToken {
                    attempt_id,
                    subject,
                },
                VerificationEvent::TokenRejected { message, .. },
            ) => {
                debug!(
                    attempt_id = %attempt_id,
                    backend_message = message.as_deref().unwrap_or(""),
                    "token request rejected"
                );
                deny(attempt_id, subject, DenyReason::SubjectNotRecognized, false)
            }
            (
                SessionState::RequestingToken {
                    attempt_id,
                    subject,
                },
                VerificationEvent::TokenRequestFailed { cause, .. },
            ) => fail(attempt_id, subject, VerificationError::Network(cause), false),

            // ===== Capture =====
            (
                SessionState::EngineActive {
                    attempt_id,
                    subject,
                    ..
                },
                VerificationEvent::CaptureStartFailed { cause, .. },
            ) => fail(
                attempt_id,
                subject,
                VerificationError::EngineFault(cause),
                true,
            ),
            (
                SessionState::EngineActive {
                    attempt_id,
                    subject,
                    token,
                },
                VerificationEvent::Capture { event, .. },
            ) => match event {
                CaptureEvent::Processing { progress, message } => (
                    SessionState::EngineActive {
                        attempt_id: attempt_id.clone(),
                        subject,
                        token,
                    },
                    vec![VerificationAction::Notify(
                        VerificationNotification::Progress {
                            attempt_id,
                            progress,
                            message,
                        },
                    )],
                ),
                CaptureEvent::Success { token: reported } if token.matches(&reported) => (
                    SessionState::Validating {
                        attempt_id: attempt_id.clone(),
                        subject: subject.clone(),
                        token: token.clone(),
                    },
                    vec![
                        VerificationAction::CloseCapture,
                        VerificationAction::Validate {
                            attempt_id,
                            subject,
                            token,
                        },
                    ],
                ),
                CaptureEvent::Success { .. } => {
                    warn!(
                        attempt_id = %attempt_id,
                        expected = %token.fingerprint(),
                        "capture engine reported a foreign session token"
                    );
                    fail(attempt_id, subject, VerificationError::TokenMismatch, true)
                }
                CaptureEvent::Failure { reason_code } => deny(
                    attempt_id,
                    subject,
                    DenyReason::Capture { reason_code },
                    true,
                ),
                CaptureEvent::Error { detail } => fail(
                    attempt_id,
                    subject,
                    VerificationError::EngineFault(detail),
                    true,
                ),
            },
            (
                SessionState::EngineActive {
                    attempt_id,
                    subject,
                    ..
                },
                VerificationEvent::CaptureStreamClosed { .. },
            ) => fail(
                attempt_id,
                subject,
                VerificationError::EngineFault(CAPTURE_STREAM_CLOSED.to_string()),
                true,
            ),
            (
                SessionState::EngineActive {
                    attempt_id,
                    subject,
                    ..
                },
                VerificationEvent::CaptureIdleTimeout { .. },
            ) => fail(
                attempt_id,
                subject,
                VerificationError::EngineFault(CAPTURE_IDLE_TIMEOUT.to_string()),
                true,
            ),

            // ===== Validation =====
            (
                SessionState::Validating {
                    attempt_id,
                    subject,
                    ..
                },
                VerificationEvent::ValidationCompleted { passed: true, .. },
            ) => (
                SessionState::Granted {
                    attempt_id: attempt_id.clone(),
                    subject: subject.clone(),
                },
                vec![
                    VerificationAction::Notify(VerificationNotification::Granted {
                        attempt_id,
                        subject,
                    }),
                    VerificationAction::ResetSession,
                ],
            ),
            (
                SessionState::Validating {
                    attempt_id,
                    subject,
                    ..
                },
                VerificationEvent::ValidationCompleted { passed: false, .. },
            ) => deny(attempt_id, subject, DenyReason::ValidationNotPassed, false),
            (
                SessionState::Validating {
                    attempt_id,
                    subject,
                    ..
                },
                VerificationEvent::ValidationFailed { cause, .. },
            ) => fail(attempt_id, subject, VerificationError::Network(cause), false),
            (state @ SessionState::Validating { .. }, VerificationEvent::Capture { event, .. }) => {
                debug!(
                    capture = event.kind(),
                    "ignoring capture event after the terminal one"
                );
                (state, vec![])
            }
            (
                state @ SessionState::Validating { .. },
                event @ (VerificationEvent::CaptureStreamClosed { .. }
                | VerificationEvent::CaptureIdleTimeout { .. }),
            ) => {
                debug!(
                    event = event.name(),
                    "ignoring capture event after the terminal one"
                );
                (state, vec![])
            }

            // ===== Abandon / Reset =====
            (SessionState::Idle, VerificationEvent::Abandon) => (SessionState::Idle, vec![]),
            (state, VerificationEvent::Abandon) => match state.attempt_id().cloned() {
                Some(attempt_id) => (
                    SessionState::Idle,
                    vec![
                        VerificationAction::CloseCapture,
                        VerificationAction::Notify(VerificationNotification::SessionReset {
                            attempt_id,
                            reason: ResetReason::Abandoned,
                        }),
                    ],
                ),
                None => (SessionState::Idle, vec![]),
            },
            (state, VerificationEvent::Reset) if state.phase().is_terminal() => {
                match state.attempt_id().cloned() {
                    Some(attempt_id) => (
                        SessionState::Idle,
                        vec![VerificationAction::Notify(
                            VerificationNotification::SessionReset {
                                attempt_id,
                                reason: ResetReason::Completed,
                            },
                        )],
                    ),
                    None => (SessionState::Idle, vec![]),
                }
            }

            // ===== Terminal =====
            (state @ SessionState::Granted { .. }, _) => (state, vec![]),
            (state @ SessionState::Denied { .. }, _) => (state, vec![]),
            (state @ SessionState::Failed { .. }, _) => (state, vec![]),

            // ===== Invalid =====
            (state, event) => {
                warn!(
                    phase = ?state.phase(),
                    event = event.name(),
                    "invalid verification transition"
                );
                (state, vec![])
            }
        }
    }
}

fn deny(
    attempt_id: AttemptId,
    subject: SubjectId,
    reason: DenyReason,
    close_capture: bool,
) -> (SessionState, Vec<VerificationAction>) {
    let mut actions = Vec::with_capacity(3);
    if close_capture {
        actions.push(VerificationAction::CloseCapture);
    }
    actions.push(VerificationAction::Notify(
        VerificationNotification::Denied {
            attempt_id: attempt_id.clone(),
            reason: reason.clone(),
        },
    ));
    actions.push(VerificationAction::ResetSession);
    (
        SessionState::Denied {
            attempt_id,
            subject,
            reason,
        },
        actions,
    )
}

fn fail(
    attempt_id: AttemptId,
    subject: SubjectId,
    error: VerificationError,
    close_capture: bool,
) -> (SessionState, Vec<VerificationAction>) {
    let mut actions = Vec::with_capacity(3);
    if close_capture {
        actions.push(VerificationAction::CloseCapture);
    }
    actions.push(VerificationAction::Notify(
        VerificationNotification::Failed {
            attempt_id: attempt_id.clone(),
            error: error.clone(),
        },
    ));
    actions.push(VerificationAction::ResetSession);
    (
        SessionState::Failed {
            attempt_id,
            subject,
            error,
        },
        actions,
    )
}
