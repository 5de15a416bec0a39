use async_trait::async_trait;
use tokio::sync::mpsc;

use idf_core::{AttemptId, SessionPhase, VerificationNotification};

use super::VerificationOrchestratorError;

/// Subscription to verification notifications.
///
/// Each subscriber gets every notification emitted after it subscribed, in
/// emission order.
#[async_trait]
pub trait VerificationEventPort: Send + Sync {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<VerificationNotification>>;
}

/// Caller-facing verification operations.
#[async_trait]
pub trait VerificationFacade: Send + Sync {
    async fn initiate(&self, subject: &str) -> Result<AttemptId, VerificationOrchestratorError>;
    async fn abandon(&self) -> Result<(), VerificationOrchestratorError>;
    async fn current_phase(&self) -> SessionPhase;
}
