//! Identiface application orchestration layer.
//!
//! Use cases that drive the core verification state machine against the
//! identity backend and capture engine ports.

pub mod usecases;

pub use usecases::verification::{
    VerificationConfig, VerificationEventPort, VerificationFacade, VerificationOrchestrator,
    VerificationOrchestratorError, VerificationRuntime,
};
