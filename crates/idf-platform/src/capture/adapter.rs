use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use idf_core::ports::{CaptureEnginePort, CaptureStartError, CaptureStream};
use idf_core::SessionToken;

use super::native::{translate, NativeCaptureEngine, NativeStatusCallback};

/// Exposes a callback-based native engine as a [`CaptureEnginePort`].
///
/// Each `start` launches one native session. Closing or dropping the returned
/// stream cancels it.
pub struct CaptureEngineAdapter<E> {
    engine: E,
}

impl<E: NativeCaptureEngine> CaptureEngineAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<E: NativeCaptureEngine> CaptureEnginePort for CaptureEngineAdapter<E> {
    async fn start(
        &self,
        streaming_endpoint: &str,
        token: &SessionToken,
    ) -> Result<CaptureStream, CaptureStartError> {
        let endpoint = streaming_endpoint.trim();
        if endpoint.is_empty() {
            return Err(CaptureStartError::InvalidEndpoint(
                "streaming endpoint is empty".to_string(),
            ));
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let on_status: NativeStatusCallback = Box::new(move |update| {
            if events_tx.send(translate(update)).is_err() {
                debug!("capture stream closed, dropping native status update");
            }
        });

        let mut handle = self
            .engine
            .launch(endpoint, token.as_str(), on_status)
            .map_err(|err| {
                warn!(error = %err, "native capture engine refused to launch");
                CaptureStartError::Unavailable(format!("{err:#}"))
            })?;

        let (close_tx, close_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            // resolves on explicit close and on stream drop
            let _ = close_rx.await;
            handle.cancel();
            debug!("native capture session cancelled");
        });

        Ok(CaptureStream::new(events_rx, close_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use idf_core::CaptureEvent;

    use crate::capture::native::{NativeCaptureHandle, NativeCaptureUpdate};

    struct RecordingEngine {
        updates: Vec<NativeCaptureUpdate>,
        launches: Mutex<Vec<(String, String)>>,
        cancelled: Arc<AtomicBool>,
        refuse: bool,
    }

    impl RecordingEngine {
        fn new(updates: Vec<NativeCaptureUpdate>) -> Self {
            Self {
                updates,
                launches: Mutex::new(Vec::new()),
                cancelled: Arc::new(AtomicBool::new(false)),
                refuse: false,
            }
        }
    }

    struct RecordingHandle {
        cancelled: Arc<AtomicBool>,
    }

    impl NativeCaptureHandle for RecordingHandle {
        fn cancel(&mut self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    impl NativeCaptureEngine for RecordingEngine {
        fn launch(
            &self,
            streaming_endpoint: &str,
            token: &str,
            on_status: NativeStatusCallback,
        ) -> anyhow::Result<Box<dyn NativeCaptureHandle>> {
            if self.refuse {
                anyhow::bail!("camera permission denied");
            }
            self.launches
                .lock()
                .unwrap()
                .push((streaming_endpoint.to_string(), token.to_string()));
            for update in &self.updates {
                on_status(update.clone());
            }
            Ok(Box::new(RecordingHandle {
                cancelled: self.cancelled.clone(),
            }))
        }
    }

    fn token() -> SessionToken {
        SessionToken::parse("T1").unwrap()
    }

    #[tokio::test]
    async fn native_updates_are_translated_in_order() {
        let adapter = CaptureEngineAdapter::new(RecordingEngine::new(vec![
            NativeCaptureUpdate::connecting(),
            NativeCaptureUpdate::processing(0.5, "Hold still"),
            NativeCaptureUpdate::success("T1"),
        ]));

        let mut stream = adapter.start(" wss://stream.test/v1 ", &token()).await.unwrap();

        assert_eq!(
            stream.next().await,
            Some(CaptureEvent::processing(0.0, "Connecting"))
        );
        assert_eq!(
            stream.next().await,
            Some(CaptureEvent::processing(0.5, "Hold still"))
        );
        assert_eq!(
            stream.next().await,
            Some(CaptureEvent::Success {
                token: "T1".to_string()
            })
        );

        let launches = adapter.engine.launches.lock().unwrap().clone();
        assert_eq!(
            launches,
            vec![("wss://stream.test/v1".to_string(), "T1".to_string())]
        );
    }

    #[tokio::test]
    async fn dropping_stream_cancels_native_session() {
        let adapter = CaptureEngineAdapter::new(RecordingEngine::new(vec![]));
        let cancelled = adapter.engine.cancelled.clone();

        let stream = adapter.start("wss://stream.test/v1", &token()).await.unwrap();
        drop(stream);

        for _ in 0..100 {
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn empty_endpoint_is_rejected_before_launch() {
        let adapter = CaptureEngineAdapter::new(RecordingEngine::new(vec![]));

        let result = adapter.start("  ", &token()).await;

        assert!(matches!(result, Err(CaptureStartError::InvalidEndpoint(_))));
        assert!(adapter.engine.launches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn launch_failure_is_unavailable() {
        let mut engine = RecordingEngine::new(vec![]);
        engine.refuse = true;
        let adapter = CaptureEngineAdapter::new(engine);

        let result = adapter.start("wss://stream.test/v1", &token()).await;

        match result {
            Err(CaptureStartError::Unavailable(detail)) => {
                assert!(detail.contains("camera permission denied"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
