use std::time::Duration;

use anyhow::{bail, Result};

use idf_core::config::DEFAULT_CALL_TIMEOUT_SECS;
use idf_core::AppConfig;

const DEFAULT_TOKEN_PATH: &str = "/face/verify/token";
const DEFAULT_VALIDATE_PATH: &str = "/face/verify/validate";

/// Connection settings for [`super::HttpIdentityBackend`].
#[derive(Clone)]
pub struct HttpBackendSettings {
    pub base_url: String,
    pub token_path: String,
    pub validate_path: String,
    pub service_id: String,
    pub password: String,
    pub transaction_type: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpBackendSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackendSettings")
            .field("base_url", &self.base_url)
            .field("token_path", &self.token_path)
            .field("validate_path", &self.validate_path)
            .field("service_id", &self.service_id)
            .field("password", &"<redacted>")
            .field("transaction_type", &self.transaction_type)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpBackendSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token_path: DEFAULT_TOKEN_PATH.to_string(),
            validate_path: DEFAULT_VALIDATE_PATH.to_string(),
            service_id: String::new(),
            password: String::new(),
            transaction_type: String::new(),
            timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        let backend = &config.backend;
        if backend.base_url.trim().is_empty() {
            bail!("backend.base_url is not configured");
        }

        let or_default = |value: &str, default: &str| {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value.trim().to_string()
            }
        };

        Ok(Self {
            base_url: backend.base_url.trim().to_string(),
            token_path: or_default(&backend.token_path, DEFAULT_TOKEN_PATH),
            validate_path: or_default(&backend.validate_path, DEFAULT_VALIDATE_PATH),
            service_id: backend.service_id.clone(),
            password: backend.password.clone(),
            transaction_type: backend.transaction_type.clone(),
            timeout: backend.call_timeout(),
        })
    }

    pub fn token_url(&self) -> String {
        join_url(&self.base_url, &self.token_path)
    }

    pub fn validate_url(&self) -> String {
        join_url(&self.base_url, &self.validate_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
