//! Builds the verification orchestrator from configuration.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;

use idf_app::{VerificationConfig, VerificationOrchestrator};
use idf_core::config::AppConfig;
use idf_infra::{HttpBackendSettings, HttpIdentityBackend};
use idf_platform::{CaptureEngineAdapter, CaptureScript, ScriptedCaptureEngine};

/// Wires the HTTP backend and the scripted capture engine into a running
/// orchestrator. Must be called inside a tokio runtime.
pub fn build_orchestrator(
    config: &AppConfig,
    script: CaptureScript,
) -> anyhow::Result<VerificationOrchestrator> {
    let settings = HttpBackendSettings::from_app_config(config)?;
    let verification = VerificationConfig::from_app_config(config);
    if verification.streaming_endpoint.is_empty() {
        bail!("capture.streaming_endpoint is not configured");
    }

    info!(
        backend = %settings.base_url,
        endpoint = %verification.streaming_endpoint,
        timeout_ms = verification.call_timeout.as_millis() as u64,
        "wiring verification orchestrator"
    );

    let backend = HttpIdentityBackend::new(settings).context("failed to create identity backend")?;
    let engine = CaptureEngineAdapter::new(ScriptedCaptureEngine::new(script));

    Ok(VerificationOrchestrator::spawn(
        verification,
        Arc::new(backend),
        Arc::new(engine),
    ))
}
