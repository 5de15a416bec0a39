//! Capture engine event contract.

mod event;

pub use event::CaptureEvent;
