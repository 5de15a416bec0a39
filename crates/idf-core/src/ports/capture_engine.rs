use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::capture::CaptureEvent;
use crate::ids::SessionToken;

use super::errors::CaptureStartError;

/// Event stream of one capture session.
///
/// Dropping the stream closes the session on the engine side.
#[derive(Debug)]
pub struct CaptureStream {
    events: mpsc::UnboundedReceiver<CaptureEvent>,
    close_tx: Option<oneshot::Sender<()>>,
}

impl CaptureStream {
    pub fn new(
        events: mpsc::UnboundedReceiver<CaptureEvent>,
        close_tx: oneshot::Sender<()>,
    ) -> Self {
        Self {
            events,
            close_tx: Some(close_tx),
        }
    }

    /// A stream whose engine needs no close signal.
    pub fn detached(events: mpsc::UnboundedReceiver<CaptureEvent>) -> Self {
        Self {
            events,
            close_tx: None,
        }
    }

    /// Next engine event, `None` once the engine side has gone away.
    pub async fn next(&mut self) -> Option<CaptureEvent> {
        self.events.recv().await
    }

    /// Asks the engine to stop. Idempotent.
    pub fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
        self.events.close();
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Biometric capture engine.
#[async_trait]
pub trait CaptureEnginePort: Send + Sync {
    /// Starts a capture session bound to `token`.
    async fn start(
        &self,
        streaming_endpoint: &str,
        token: &SessionToken,
    ) -> Result<CaptureStream, CaptureStartError>;
}
