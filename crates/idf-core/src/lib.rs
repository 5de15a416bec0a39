//! # idf-core
//!
//! Core domain models and business logic for Identiface.
//!
//! This crate contains the verification session state machine and the ports
//! it talks through, without any infrastructure dependencies.

pub mod capture;
pub mod config;
pub mod ids;
pub mod ports;
pub mod session;
pub mod verification;

// Re-export commonly used types at the crate root
pub use capture::CaptureEvent;
pub use config::AppConfig;
pub use ids::{AttemptId, SessionToken, SubjectId};
pub use session::{SessionPhase, SessionState};
pub use verification::{
    DenyReason, VerificationAction, VerificationError, VerificationEvent,
    VerificationNotification, VerificationStateMachine,
};
