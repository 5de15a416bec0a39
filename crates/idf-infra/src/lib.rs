//! Infrastructure adapters for Identiface.
//!
//! Implements the core ports against real services: the identity backend is
//! reached over HTTP with `reqwest`.

pub mod backend;

pub use backend::{HttpBackendSettings, HttpIdentityBackend};
