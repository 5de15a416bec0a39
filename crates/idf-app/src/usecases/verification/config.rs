use std::time::Duration;

use idf_core::AppConfig;

/// Runtime settings for the verification orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationConfig {
    /// Endpoint handed to the capture engine on start.
    pub streaming_endpoint: String,
    /// Upper bound for each backend call.
    pub call_timeout: Duration,
    /// Fails the attempt when the engine goes quiet for this long.
    pub idle_timeout: Option<Duration>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::empty())
    }
}

impl VerificationConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        let idle_timeout = match config.capture.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        Self {
            streaming_endpoint: config.capture.streaming_endpoint.trim().to_string(),
            call_timeout: config.backend.call_timeout(),
            idle_timeout,
        }
    }
}
