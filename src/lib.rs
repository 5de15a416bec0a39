//! Identiface command line driver.
//!
//! Loads configuration, installs tracing and wires the HTTP identity backend
//! and scripted capture engine into the verification orchestrator.

pub mod bootstrap;
pub mod cli;
