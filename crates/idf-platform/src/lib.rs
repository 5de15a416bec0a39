//! # idf-platform
//!
//! Capture engine adapters for Identiface.
//!
//! Native biometric SDKs report progress through callbacks on their own
//! threads. This crate bridges that callback shape into the uniform
//! `CaptureStream` the orchestrator consumes, and ships a scripted engine
//! for demos and tests.

pub mod capture;
pub mod scripted;

pub use capture::{
    CaptureEngineAdapter, NativeCaptureEngine, NativeCaptureHandle, NativeCaptureState,
    NativeCaptureUpdate, NativeStatusCallback,
};
pub use scripted::{CaptureScript, ScriptParseError, ScriptedCaptureEngine};
