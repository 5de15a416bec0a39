//! Callback shape shared by native capture SDK bindings.

use serde::Deserialize;

use idf_core::CaptureEvent;

const UNKNOWN_FEEDBACK_CODE: &str = "unknown";
const UNSPECIFIED_ENGINE_ERROR: &str = "unspecified capture engine error";
const CANCELLED_BY_USER: &str = "capture cancelled by user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeCaptureState {
    Connecting,
    Connected,
    Processing,
    Success,
    Failure,
    Error,
    Cancelled,
}

/// One status callback from a native engine.
///
/// Which optional fields are set depends on `state`; bindings usually
/// deserialize this straight from the SDK's status payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NativeCaptureUpdate {
    pub state: NativeCaptureState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub feedback_code: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl NativeCaptureUpdate {
    fn with_state(state: NativeCaptureState) -> Self {
        Self {
            state,
            progress: None,
            message: None,
            token: None,
            feedback_code: None,
            error_description: None,
        }
    }

    pub fn connecting() -> Self {
        Self::with_state(NativeCaptureState::Connecting)
    }

    pub fn processing(progress: f64, message: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            message: Some(message.into()),
            ..Self::with_state(NativeCaptureState::Processing)
        }
    }

    pub fn success(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::with_state(NativeCaptureState::Success)
        }
    }

    pub fn failure(feedback_code: impl Into<String>) -> Self {
        Self {
            feedback_code: Some(feedback_code.into()),
            ..Self::with_state(NativeCaptureState::Failure)
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            error_description: Some(description.into()),
            ..Self::with_state(NativeCaptureState::Error)
        }
    }

    pub fn cancelled() -> Self {
        Self::with_state(NativeCaptureState::Cancelled)
    }
}

pub type NativeStatusCallback = Box<dyn Fn(NativeCaptureUpdate) + Send + Sync + 'static>;

/// Running native capture session.
pub trait NativeCaptureHandle: Send {
    /// Stops the session; no callbacks are expected afterwards.
    fn cancel(&mut self);
}

/// Native biometric capture engine binding.
///
/// `on_status` may be invoked from any thread.
pub trait NativeCaptureEngine: Send + Sync {
    fn launch(
        &self,
        streaming_endpoint: &str,
        token: &str,
        on_status: NativeStatusCallback,
    ) -> anyhow::Result<Box<dyn NativeCaptureHandle>>;
}

/// Maps a native status callback onto the uniform capture event.
///
/// Payloads are passed through as-is; a success without a token reports an
/// empty one, which never matches the session token.
pub fn translate(update: NativeCaptureUpdate) -> CaptureEvent {
    match update.state {
        NativeCaptureState::Connecting => {
            CaptureEvent::processing(0.0, update.message.unwrap_or_else(|| "Connecting".into()))
        }
        NativeCaptureState::Connected => {
            CaptureEvent::processing(0.0, update.message.unwrap_or_else(|| "Connected".into()))
        }
        NativeCaptureState::Processing => CaptureEvent::processing(
            update.progress.unwrap_or(0.0) as f32,
            update.message.unwrap_or_default(),
        ),
        NativeCaptureState::Success => CaptureEvent::Success {
            token: update.token.unwrap_or_default(),
        },
        NativeCaptureState::Failure => CaptureEvent::Failure {
            reason_code: update
                .feedback_code
                .unwrap_or_else(|| UNKNOWN_FEEDBACK_CODE.to_string()),
        },
        NativeCaptureState::Error => CaptureEvent::Error {
            detail: update
                .error_description
                .unwrap_or_else(|| UNSPECIFIED_ENGINE_ERROR.to_string()),
        },
        NativeCaptureState::Cancelled => CaptureEvent::Error {
            detail: CANCELLED_BY_USER.to_string(),
        },
    }
}
