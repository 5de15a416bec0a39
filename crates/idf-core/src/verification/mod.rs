//! Verification session domain: events, actions, outcomes and the pure
//! transition table driving one attempt.

pub mod action;
pub mod error;
pub mod event;
pub mod feedback;
pub mod notification;
pub mod reason;
pub mod state_machine;

pub use action::VerificationAction;
pub use error::VerificationError;
pub use event::VerificationEvent;
pub use feedback::{feedback_for, welcome_message, FeedbackMessage};
pub use notification::{ResetReason, VerificationNotification};
pub use reason::DenyReason;
pub use state_machine::VerificationStateMachine;
