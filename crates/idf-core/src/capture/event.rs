use serde::{Deserialize, Serialize};

/// One status update from the biometric capture engine.
///
/// `Processing` may repeat any number of times and its progress is not
/// guaranteed to be monotonic. The other variants are terminal: the first
/// one ends the capture session and anything after it is ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaptureEvent {
    Processing { progress: f32, message: String },
    Success { token: String },
    Failure { reason_code: String },
    Error { detail: String },
}

impl CaptureEvent {
    /// Builds a `Processing` event with progress clamped to `0.0..=1.0`.
    pub fn processing(progress: f32, message: impl Into<String>) -> Self {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        Self::Processing {
            progress,
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Processing { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Processing { .. } => "processing",
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
            Self::Error { .. } => "error",
        }
    }
}
