//! Process bootstrap: configuration, tracing, dependency wiring and command
//! execution.

pub mod config;
pub mod run;
pub mod tracing;
pub mod wiring;
