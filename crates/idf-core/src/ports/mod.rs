//! Port interfaces for the verification use case.
//!
//! The orchestrator only talks to the identity backend and the capture engine
//! through these traits; HTTP and native engine adapters live in
//! `idf-infra` and `idf-platform`.

pub mod backend;
pub mod capture_engine;
pub mod errors;

#[cfg(test)]
pub(crate) mod tests;

pub use backend::{IdentityBackendPort, TokenResponse, ValidationResponse};
pub use capture_engine::{CaptureEnginePort, CaptureStream};
pub use errors::{CaptureStartError, NetworkError};
