//! Verification session use case.

mod config;
mod events;
mod orchestrator;

pub use config::VerificationConfig;
pub use events::{VerificationEventPort, VerificationFacade};
pub use orchestrator::{VerificationOrchestrator, VerificationOrchestratorError, VerificationRuntime};
