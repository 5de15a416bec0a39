//! Configuration loading.
//!
//! Reads the TOML file into the `AppConfig` DTO and applies environment
//! overrides. No validation happens here; consumers decide what an empty
//! value means.

use std::path::{Path, PathBuf};

use anyhow::Context;

use idf_core::config::AppConfig;

pub const ENV_BACKEND_URL: &str = "IDENTIFACE_BACKEND_URL";
pub const ENV_SERVICE_ID: &str = "IDENTIFACE_SERVICE_ID";
pub const ENV_BACKEND_PW: &str = "IDENTIFACE_BACKEND_PW";

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("identiface").join("config.toml"))
}

/// Loads the explicit file if given, otherwise the default file when it
/// exists, then applies environment overrides.
pub fn resolve_config(explicit: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match explicit {
        Some(path) => load_config(path.to_path_buf())?,
        None => match default_config_path() {
            Some(path) if path.exists() => load_config(path)?,
            _ => AppConfig::empty(),
        },
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Non-empty values returned by `lookup` replace the file values.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(url) = non_empty(ENV_BACKEND_URL) {
        config.backend.base_url = url;
    }
    if let Some(service_id) = non_empty(ENV_SERVICE_ID) {
        config.backend.service_id = service_id;
    }
    if let Some(password) = non_empty(ENV_BACKEND_PW) {
        config.backend.password = password;
    }
}
