//! Configuration DTOs, TOML mapping only.
//!
//! Missing keys become empty strings or zero. Validation belongs to the
//! layers that consume these values; the backend call timeout is resolved
//! here because both the HTTP client and the orchestrator deadline use it.

use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 10;
pub const MAX_CALL_TIMEOUT_SECS: u64 = 120;

/// Application configuration read from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub capture: CaptureConfig,
    pub logging: LoggingConfig,
}

/// `[backend]` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub token_path: String,
    pub validate_path: String,
    pub service_id: String,
    pub password: String,
    pub transaction_type: String,
    /// Per-call timeout in seconds, 0 when not configured.
    pub timeout_secs: u64,
}

/// `[capture]` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureConfig {
    pub streaming_endpoint: String,
    /// Seconds without an engine event before the attempt fails, 0 disables.
    pub idle_timeout_secs: u64,
}

/// `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggingConfig {
    pub file_logging: bool,
}

impl BackendConfig {
    /// Per-call timeout: 0 means the default, larger values are capped.
    pub fn call_timeout(&self) -> Duration {
        let secs = match self.timeout_secs {
            0 => DEFAULT_CALL_TIMEOUT_SECS,
            secs => secs.min(MAX_CALL_TIMEOUT_SECS),
        };
        Duration::from_secs(secs)
    }
}

impl AppConfig {
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let str_at = |table: &str, key: &str| -> String {
            toml_value
                .get(table)
                .and_then(|t| t.get(key))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };
        let secs_at = |table: &str, key: &str| -> u64 {
            toml_value
                .get(table)
                .and_then(|t| t.get(key))
                .and_then(|v| v.as_integer())
                .map(|v| v.max(0) as u64)
                .unwrap_or(0)
        };

        Ok(Self {
            backend: BackendConfig {
                base_url: str_at("backend", "base_url"),
                token_path: str_at("backend", "token_path"),
                validate_path: str_at("backend", "validate_path"),
                service_id: str_at("backend", "service_id"),
                password: str_at("backend", "password"),
                transaction_type: str_at("backend", "transaction_type"),
                timeout_secs: secs_at("backend", "timeout_secs"),
            },
            capture: CaptureConfig {
                streaming_endpoint: str_at("capture", "streaming_endpoint"),
                idle_timeout_secs: secs_at("capture", "idle_timeout_secs"),
            },
            logging: LoggingConfig {
                file_logging: toml_value
                    .get("logging")
                    .and_then(|l| l.get("file_logging"))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
            },
        })
    }

    /// Configuration with every field empty, used when no file exists.
    pub fn empty() -> Self {
        Self::default()
    }
}
