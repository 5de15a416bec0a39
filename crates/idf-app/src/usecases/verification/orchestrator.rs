//! Verification session orchestrator.
//!
//! Serialises caller requests, backend replies and capture engine events into
//! one inbox, feeds them through the pure state machine and executes the
//! resulting actions.
//!
//! ```text
//! initiate / abandon        backend replies / capture events
//!        ↓                               ↓
//! VerificationOrchestrator ──inbox──> VerificationRuntime
//!                                        ↓
//!                          VerificationStateMachine (pure transitions)
//!                                        ↓
//!          VerificationActions (backend calls, capture pump, notifications)
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, info_span, warn, Instrument};

use idf_core::ports::{CaptureEnginePort, IdentityBackendPort, NetworkError, TokenResponse};
use idf_core::{
    AttemptId, SessionPhase, SessionState, SessionToken, SubjectId, VerificationAction,
    VerificationError, VerificationEvent, VerificationNotification, VerificationStateMachine,
};

use super::{VerificationConfig, VerificationEventPort, VerificationFacade};

const SUBSCRIBER_BUFFER: usize = 100;

/// Errors produced by the verification orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum VerificationOrchestratorError {
    #[error(transparent)]
    Rejected(#[from] VerificationError),
    #[error("verification runtime is not running")]
    RuntimeStopped,
}

type NotificationSenders = Arc<Mutex<Vec<mpsc::Sender<VerificationNotification>>>>;

enum Command {
    Initiate {
        subject: SubjectId,
        reply: oneshot::Sender<Result<AttemptId, VerificationError>>,
    },
    Abandon {
        reply: oneshot::Sender<()>,
    },
    RejectInput {
        detail: String,
    },
    Event(VerificationEvent),
}

/// Handle used by callers to drive verification attempts.
///
/// Cheap to clone. All handles talk to the same [`VerificationRuntime`],
/// which must be running for requests to complete.
#[derive(Clone, Debug)]
pub struct VerificationOrchestrator {
    inbox: mpsc::UnboundedSender<Command>,
    state: Arc<RwLock<SessionState>>,
    event_senders: NotificationSenders,
}

/// Owns the session and executes state machine actions.
pub struct VerificationRuntime {
    config: VerificationConfig,
    backend: Arc<dyn IdentityBackendPort>,
    engine: Arc<dyn CaptureEnginePort>,
    inbox_rx: mpsc::UnboundedReceiver<Command>,
    inbox_tx: mpsc::WeakUnboundedSender<Command>,
    state: Arc<RwLock<SessionState>>,
    event_senders: NotificationSenders,
    backend_call: Option<AbortHandle>,
    capture: Option<CaptureTask>,
}

struct CaptureTask {
    attempt_id: AttemptId,
    handle: JoinHandle<()>,
}

impl VerificationOrchestrator {
    pub fn new(
        config: VerificationConfig,
        backend: Arc<dyn IdentityBackendPort>,
        engine: Arc<dyn CaptureEnginePort>,
    ) -> (Self, VerificationRuntime) {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(SessionState::Idle));
        let event_senders: NotificationSenders = Arc::new(Mutex::new(Vec::new()));

        let runtime = VerificationRuntime {
            config,
            backend,
            engine,
            inbox_rx,
            inbox_tx: inbox_tx.downgrade(),
            state: state.clone(),
            event_senders: event_senders.clone(),
            backend_call: None,
            capture: None,
        };

        (
            Self {
                inbox: inbox_tx,
                state,
                event_senders,
            },
            runtime,
        )
    }

    /// Creates the orchestrator and spawns its runtime on the current tokio runtime.
    pub fn spawn(
        config: VerificationConfig,
        backend: Arc<dyn IdentityBackendPort>,
        engine: Arc<dyn CaptureEnginePort>,
    ) -> Self {
        let (orchestrator, runtime) = Self::new(config, backend, engine);
        tokio::spawn(runtime.run());
        orchestrator
    }

    /// Starts a verification attempt for `subject`.
    ///
    /// Blank input is rejected with `Validation` before anything reaches the
    /// backend. While another attempt is in progress the call fails with
    /// `SessionBusy` and the running attempt is left untouched.
    pub async fn initiate(&self, subject: &str) -> Result<AttemptId, VerificationOrchestratorError> {
        let subject = match SubjectId::parse(subject) {
            Ok(subject) => subject,
            Err(err) => {
                let detail = err.to_string();
                warn!(%detail, "rejecting verification request");
                self.send(Command::RejectInput {
                    detail: detail.clone(),
                })?;
                return Err(VerificationError::Validation(detail).into());
            }
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Initiate {
            subject,
            reply: reply_tx,
        })?;
        let attempt_id = reply_rx
            .await
            .map_err(|_| VerificationOrchestratorError::RuntimeStopped)??;
        Ok(attempt_id)
    }

    /// Abandons the current attempt. A no-op when idle.
    pub async fn abandon(&self) -> Result<(), VerificationOrchestratorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Abandon { reply: reply_tx })?;
        reply_rx
            .await
            .map_err(|_| VerificationOrchestratorError::RuntimeStopped)
    }

    pub async fn current_state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn current_phase(&self) -> SessionPhase {
        self.state.read().await.phase()
    }

    fn send(&self, command: Command) -> Result<(), VerificationOrchestratorError> {
        self.inbox
            .send(command)
            .map_err(|_| VerificationOrchestratorError::RuntimeStopped)
    }
}

impl VerificationRuntime {
    /// Processes the inbox until every orchestrator handle is dropped.
    pub async fn run(mut self) {
        info!("verification runtime started");
        while let Some(command) = self.inbox_rx.recv().await {
            self.handle(command).await;
        }
        self.stop_capture();
        self.abort_backend_call();
        info!("verification runtime stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Initiate { subject, reply } => {
                let attempt_id = AttemptId::new();
                info!(
                    attempt_id = %attempt_id,
                    subject = %subject.masked(),
                    "verification requested"
                );
                self.dispatch(VerificationEvent::Initiate {
                    attempt_id: attempt_id.clone(),
                    subject,
                })
                .await;

                let result = if self.state.read().await.is_current(&attempt_id) {
                    Ok(attempt_id)
                } else {
                    Err(VerificationError::SessionBusy)
                };
                let _ = reply.send(result);
            }
            Command::Abandon { reply } => {
                self.dispatch(VerificationEvent::Abandon).await;
                let _ = reply.send(());
            }
            Command::RejectInput { detail } => {
                self.emit(VerificationNotification::ValidationError { detail })
                    .await;
            }
            Command::Event(event) => self.dispatch(event).await,
        }
    }

    async fn dispatch(&mut self, event: VerificationEvent) {
        let span = info_span!(
            "usecase.verification_orchestrator.dispatch",
            event = event.name()
        );
        async {
            let mut events = VecDeque::from([event]);

            while let Some(event) = events.pop_front() {
                let actions = {
                    let mut state = self.state.write().await;
                    let from = state.phase();
                    let (next, actions) = VerificationStateMachine::transition(state.clone(), event);
                    if next.phase() != from {
                        debug!(from = ?from, to = ?next.phase(), "verification phase changed");
                    }
                    *state = next;
                    actions
                };

                for action in actions {
                    if let Some(follow_up) = self.execute(action).await {
                        events.push_back(follow_up);
                    }
                }
            }

            if !self.state.read().await.phase().is_in_progress() {
                self.abort_backend_call();
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(&mut self, action: VerificationAction) -> Option<VerificationEvent> {
        match action {
            VerificationAction::RequestToken {
                attempt_id,
                subject,
            } => {
                self.spawn_token_request(attempt_id, subject);
                None
            }
            VerificationAction::Validate {
                attempt_id,
                subject,
                token,
            } => {
                self.spawn_validation(attempt_id, subject, token);
                None
            }
            VerificationAction::StartCapture { attempt_id, token } => {
                self.start_capture(attempt_id, token);
                None
            }
            VerificationAction::CloseCapture => {
                self.stop_capture();
                None
            }
            VerificationAction::Notify(notification) => {
                log_outcome(&notification);
                self.emit(notification).await;
                None
            }
            VerificationAction::ResetSession => Some(VerificationEvent::Reset),
        }
    }

    fn spawn_token_request(&mut self, attempt_id: AttemptId, subject: SubjectId) {
        let backend = self.backend.clone();
        let inbox = self.inbox_tx.clone();
        let limit = self.config.call_timeout;
        let span = info_span!(
            "usecase.verification_orchestrator.request_token",
            attempt_id = %attempt_id
        );

        let handle = tokio::spawn(
            async move {
                let event = match with_deadline(limit, backend.request_token(&subject)).await {
                    Ok(TokenResponse::Issued { token }) => {
                        debug!(token = %token.fingerprint(), "session token issued");
                        VerificationEvent::TokenIssued { attempt_id, token }
                    }
                    Ok(TokenResponse::Rejected { message }) => {
                        VerificationEvent::TokenRejected {
                            attempt_id,
                            message,
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "token request failed");
                        VerificationEvent::TokenRequestFailed {
                            attempt_id,
                            cause: err.to_string(),
                        }
                    }
                };
                post(&inbox, event);
            }
            .instrument(span),
        );
        self.replace_backend_call(handle.abort_handle());
    }

    fn spawn_validation(&mut self, attempt_id: AttemptId, subject: SubjectId, token: SessionToken) {
        let backend = self.backend.clone();
        let inbox = self.inbox_tx.clone();
        let limit = self.config.call_timeout;
        let span = info_span!(
            "usecase.verification_orchestrator.validate",
            attempt_id = %attempt_id
        );

        let handle = tokio::spawn(
            async move {
                let event = match with_deadline(limit, backend.validate(&subject, &token)).await
                {
                    Ok(response) => {
                        info!(
                            passed = response.passed,
                            score = ?response.score,
                            reason = ?response.reason,
                            "validation answered"
                        );
                        VerificationEvent::ValidationCompleted {
                            attempt_id,
                            passed: response.passed,
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "validation request failed");
                        VerificationEvent::ValidationFailed {
                            attempt_id,
                            cause: err.to_string(),
                        }
                    }
                };
                post(&inbox, event);
            }
            .instrument(span),
        );
        self.replace_backend_call(handle.abort_handle());
    }

    fn start_capture(&mut self, attempt_id: AttemptId, token: SessionToken) {
        self.stop_capture();

        let span = info_span!(
            "usecase.verification_orchestrator.capture",
            attempt_id = %attempt_id
        );
        let handle = tokio::spawn(
            pump_capture(
                self.engine.clone(),
                self.inbox_tx.clone(),
                self.config.streaming_endpoint.clone(),
                token,
                attempt_id.clone(),
                self.config.idle_timeout,
            )
            .instrument(span),
        );
        self.capture = Some(CaptureTask { attempt_id, handle });
    }

    fn stop_capture(&mut self) {
        if let Some(task) = self.capture.take() {
            debug!(attempt_id = %task.attempt_id, "closing capture session");
            task.handle.abort();
        }
    }

    fn replace_backend_call(&mut self, handle: AbortHandle) {
        if let Some(previous) = self.backend_call.replace(handle) {
            previous.abort();
        }
    }

    fn abort_backend_call(&mut self) {
        if let Some(handle) = self.backend_call.take() {
            handle.abort();
        }
    }

    /// Never waits on a subscriber: a full channel loses this notification,
    /// a closed one is pruned.
    async fn emit(&self, notification: VerificationNotification) {
        let mut senders = self.event_senders.lock().await;
        senders.retain(|sender| match sender.try_send(notification.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("verification subscriber is not draining, notification dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("verification notification receiver dropped");
                false
            }
        });
    }
}

/// Forwards engine events to the runtime until the first terminal one.
///
/// Returning drops the stream, which closes the engine session.
async fn pump_capture(
    engine: Arc<dyn CaptureEnginePort>,
    inbox: mpsc::WeakUnboundedSender<Command>,
    streaming_endpoint: String,
    token: SessionToken,
    attempt_id: AttemptId,
    idle_timeout: Option<Duration>,
) {
    let mut stream = match engine.start(&streaming_endpoint, &token).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(error = %err, "capture engine failed to start");
            post(
                &inbox,
                VerificationEvent::CaptureStartFailed {
                    attempt_id,
                    cause: err.to_string(),
                },
            );
            return;
        }
    };
    debug!(token = %token.fingerprint(), "capture session started");

    loop {
        let next = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(?limit, "capture engine went quiet");
                    post(&inbox, VerificationEvent::CaptureIdleTimeout { attempt_id });
                    return;
                }
            },
            None => stream.next().await,
        };

        let Some(event) = next else {
            post(&inbox, VerificationEvent::CaptureStreamClosed { attempt_id });
            return;
        };

        let terminal = event.is_terminal();
        let delivered = post(
            &inbox,
            VerificationEvent::Capture {
                attempt_id: attempt_id.clone(),
                event,
            },
        );
        if terminal || !delivered {
            return;
        }
    }
}

async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, NetworkError>>,
) -> Result<T, NetworkError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(NetworkError::Timeout(limit)),
    }
}

fn post(inbox: &mpsc::WeakUnboundedSender<Command>, event: VerificationEvent) -> bool {
    match inbox.upgrade() {
        Some(tx) => tx.send(Command::Event(event)).is_ok(),
        None => {
            debug!("verification runtime gone, dropping event");
            false
        }
    }
}

fn log_outcome(notification: &VerificationNotification) {
    match notification {
        VerificationNotification::Granted { attempt_id, .. } => {
            info!(attempt_id = %attempt_id, "verification granted");
        }
        VerificationNotification::Denied { attempt_id, reason } => {
            info!(attempt_id = %attempt_id, reason = %reason, "verification denied");
        }
        VerificationNotification::Failed { attempt_id, error } => {
            warn!(attempt_id = %attempt_id, error = %error, kind = error.kind(), "verification failed");
        }
        _ => {}
    }
}

#[async_trait]
impl VerificationFacade for VerificationOrchestrator {
    async fn initiate(&self, subject: &str) -> Result<AttemptId, VerificationOrchestratorError> {
        Self::initiate(self, subject).await
    }

    async fn abandon(&self) -> Result<(), VerificationOrchestratorError> {
        Self::abandon(self).await
    }

    async fn current_phase(&self) -> SessionPhase {
        Self::current_phase(self).await
    }
}

#[async_trait]
impl VerificationEventPort for VerificationOrchestrator {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<VerificationNotification>> {
        let (event_tx, event_rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut senders = self.event_senders.lock().await;
        senders.push(event_tx);
        Ok(event_rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use idf_core::capture::CaptureEvent;
    use idf_core::ports::{CaptureStartError, CaptureStream, ValidationResponse};
    use idf_core::verification::ResetReason;
    use idf_core::DenyReason;
    use mockall::mock;

    struct FakeBackend {
        token: Result<TokenResponse, NetworkError>,
        validation: Result<ValidationResponse, NetworkError>,
        hang: bool,
        token_calls: AtomicUsize,
        validate_calls: AtomicUsize,
    }

    impl FakeBackend {
        fn issuing(token: &str) -> Self {
            Self {
                token: Ok(TokenResponse::Issued {
                    token: SessionToken::parse(token).unwrap(),
                }),
                validation: Ok(ValidationResponse::passed()),
                hang: false,
                token_calls: AtomicUsize::new(0),
                validate_calls: AtomicUsize::new(0),
            }
        }

        fn rejecting() -> Self {
            Self {
                token: Ok(TokenResponse::Rejected {
                    message: Some("user not found".to_string()),
                }),
                ..Self::issuing("unused")
            }
        }

        fn failing_validation(cause: &str) -> Self {
            Self {
                validation: Err(NetworkError::Transport(cause.to_string())),
                ..Self::issuing("T1")
            }
        }

        fn hanging() -> Self {
            Self {
                hang: true,
                ..Self::issuing("unused")
            }
        }
    }

    #[async_trait]
    impl IdentityBackendPort for FakeBackend {
        async fn request_token(&self, _subject: &SubjectId) -> Result<TokenResponse, NetworkError> {
            self.token_calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            self.token.clone()
        }

        async fn validate(
            &self,
            _subject: &SubjectId,
            _token: &SessionToken,
        ) -> Result<ValidationResponse, NetworkError> {
            self.validate_calls.fetch_add(1, Ordering::SeqCst);
            self.validation.clone()
        }
    }

    struct FakeEngine {
        events: Vec<CaptureEvent>,
        hold_open: bool,
        starts: AtomicUsize,
        closed: Arc<AtomicBool>,
    }

    impl FakeEngine {
        fn scripted(events: Vec<CaptureEvent>) -> Self {
            Self {
                events,
                hold_open: false,
                starts: AtomicUsize::new(0),
                closed: Arc::new(AtomicBool::new(false)),
            }
        }

        fn silent() -> Self {
            Self {
                hold_open: true,
                ..Self::scripted(vec![])
            }
        }
    }

    #[async_trait]
    impl CaptureEnginePort for FakeEngine {
        async fn start(
            &self,
            _streaming_endpoint: &str,
            _token: &SessionToken,
        ) -> Result<CaptureStream, CaptureStartError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.closed.store(false, Ordering::SeqCst);

            let (tx, rx) = mpsc::unbounded_channel();
            for event in &self.events {
                let _ = tx.send(event.clone());
            }
            let (close_tx, close_rx) = oneshot::channel::<()>();
            let closed = self.closed.clone();
            let keep = if self.hold_open { Some(tx) } else { None };
            tokio::spawn(async move {
                let _ = close_rx.await;
                drop(keep);
                closed.store(true, Ordering::SeqCst);
            });
            Ok(CaptureStream::new(rx, close_tx))
        }
    }

    mock! {
        pub Backend {}

        #[async_trait]
        impl IdentityBackendPort for Backend {
            async fn request_token(&self, subject: &SubjectId) -> Result<TokenResponse, NetworkError>;
            async fn validate(
                &self,
                subject: &SubjectId,
                token: &SessionToken,
            ) -> Result<ValidationResponse, NetworkError>;
        }
    }

    fn orchestrator(
        backend: Arc<dyn IdentityBackendPort>,
        engine: Arc<dyn CaptureEnginePort>,
    ) -> VerificationOrchestrator {
        let config = VerificationConfig {
            streaming_endpoint: "wss://stream.test/v1".to_string(),
            call_timeout: Duration::from_secs(2),
            idle_timeout: None,
        };
        VerificationOrchestrator::spawn(config, backend, engine)
    }

    async fn next_notification(
        rx: &mut mpsc::Receiver<VerificationNotification>,
    ) -> VerificationNotification {
        tokio::time::timeout(Duration::from_secs(60), rx.recv())
            .await
            .expect("timed out waiting for notification")
            .expect("notification channel closed")
    }

    async fn collect_until_reset(
        rx: &mut mpsc::Receiver<VerificationNotification>,
    ) -> Vec<VerificationNotification> {
        let mut seen = Vec::new();
        loop {
            let notification = next_notification(rx).await;
            let done = matches!(notification, VerificationNotification::SessionReset { .. });
            seen.push(notification);
            if done {
                return seen;
            }
        }
    }

    async fn wait_for_phase(orchestrator: &VerificationOrchestrator, phase: SessionPhase) {
        for _ in 0..200 {
            if orchestrator.current_phase().await == phase {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("orchestrator never reached {phase:?}");
    }

    #[tokio::test]
    async fn successful_capture_and_validation_grants_access() {
        let backend = Arc::new(FakeBackend::issuing("T1"));
        let engine = Arc::new(FakeEngine::scripted(vec![
            CaptureEvent::processing(0.3, "Align your face"),
            CaptureEvent::processing(0.7, "Hold still"),
            CaptureEvent::Success {
                token: "T1".to_string(),
            },
        ]));
        let orchestrator = orchestrator(backend.clone(), engine.clone());
        let mut rx = orchestrator.subscribe().await.unwrap();

        let attempt_id = orchestrator.initiate("G2957839M").await.unwrap();
        let seen = collect_until_reset(&mut rx).await;

        assert_eq!(seen.len(), 4, "unexpected notifications: {seen:?}");
        assert!(matches!(
            &seen[0],
            VerificationNotification::Progress { progress, .. } if (*progress - 0.3).abs() < f32::EPSILON
        ));
        assert!(matches!(&seen[1], VerificationNotification::Progress { .. }));
        assert_eq!(
            seen[2],
            VerificationNotification::Granted {
                attempt_id: attempt_id.clone(),
                subject: SubjectId::parse("G2957839M").unwrap(),
            }
        );
        assert_eq!(
            seen[3],
            VerificationNotification::SessionReset {
                attempt_id,
                reason: ResetReason::Completed,
            }
        );

        let state = orchestrator.current_state().await;
        assert!(state.is_idle());
        assert!(state.token().is_none());
        assert_eq!(backend.validate_calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn validation_transport_error_fails_and_resets() {
        let backend = Arc::new(FakeBackend::failing_validation("connection reset"));
        let engine = Arc::new(FakeEngine::scripted(vec![CaptureEvent::Success {
            token: "T1".to_string(),
        }]));
        let orchestrator = orchestrator(backend.clone(), engine);
        let mut rx = orchestrator.subscribe().await.unwrap();

        let attempt_id = orchestrator.initiate("G2957839M").await.unwrap();
        let seen = collect_until_reset(&mut rx).await;

        assert_eq!(seen.len(), 2, "unexpected notifications: {seen:?}");
        assert!(matches!(
            &seen[0],
            VerificationNotification::Failed {
                attempt_id: failed_attempt,
                error: VerificationError::Network(cause),
            } if failed_attempt == &attempt_id && cause.contains("connection reset")
        ));
        assert_eq!(
            seen[1],
            VerificationNotification::SessionReset {
                attempt_id,
                reason: ResetReason::Completed,
            }
        );
        assert_eq!(backend.validate_calls.load(Ordering::SeqCst), 1);
        let state = orchestrator.current_state().await;
        assert!(state.is_idle());
        assert!(state.token().is_none());
    }

    #[tokio::test]
    async fn stalled_subscriber_does_not_block_abandon() {
        let progress: Vec<CaptureEvent> = (0..SUBSCRIBER_BUFFER + 50)
            .map(|step| CaptureEvent::processing(0.5, format!("step {step}")))
            .collect();
        let engine = Arc::new(FakeEngine {
            hold_open: true,
            ..FakeEngine::scripted(progress)
        });
        let orchestrator = orchestrator(Arc::new(FakeBackend::issuing("T1")), engine);
        let _stalled = orchestrator.subscribe().await.unwrap();

        orchestrator.initiate("G2957839M").await.unwrap();
        wait_for_phase(&orchestrator, SessionPhase::EngineActive).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        tokio::time::timeout(Duration::from_secs(3), orchestrator.abandon())
            .await
            .expect("abandon blocked by a full subscriber channel")
            .unwrap();
        assert_eq!(orchestrator.current_phase().await, SessionPhase::Idle);

        let retry = tokio::time::timeout(Duration::from_secs(3), orchestrator.initiate("G2957839M"))
            .await
            .expect("initiate blocked by a full subscriber channel");
        assert!(retry.is_ok());
    }

    #[tokio::test]
    async fn capture_failure_denies_without_validation() {
        let backend = Arc::new(FakeBackend::issuing("T1"));
        let engine = Arc::new(FakeEngine::scripted(vec![CaptureEvent::Failure {
            reason_code: "ambiguous_outcome".to_string(),
        }]));
        let orchestrator = orchestrator(backend.clone(), engine);
        let mut rx = orchestrator.subscribe().await.unwrap();

        orchestrator.initiate("G2957839M").await.unwrap();
        let seen = collect_until_reset(&mut rx).await;

        assert!(matches!(
            &seen[0],
            VerificationNotification::Denied {
                reason: DenyReason::Capture { reason_code },
                ..
            } if reason_code == "ambiguous_outcome"
        ));
        assert_eq!(backend.validate_calls.load(Ordering::SeqCst), 0);
        assert_eq!(orchestrator.current_phase().await, SessionPhase::Idle);
    }

    #[tokio::test]
    async fn rejected_token_request_never_starts_engine() {
        let backend = Arc::new(FakeBackend::rejecting());
        let engine = Arc::new(FakeEngine::scripted(vec![]));
        let orchestrator = orchestrator(backend, engine.clone());
        let mut rx = orchestrator.subscribe().await.unwrap();

        orchestrator.initiate("UNKNOWN").await.unwrap();
        let seen = collect_until_reset(&mut rx).await;

        assert!(matches!(
            &seen[0],
            VerificationNotification::Denied {
                reason: DenyReason::SubjectNotRecognized,
                ..
            }
        ));
        assert_eq!(engine.starts.load(Ordering::SeqCst), 0);
        assert!(orchestrator.current_state().await.token().is_none());
    }

    #[tokio::test]
    async fn foreign_token_fails_with_mismatch() {
        let backend = Arc::new(FakeBackend::issuing("T1"));
        let engine = Arc::new(FakeEngine::scripted(vec![CaptureEvent::Success {
            token: "WRONG".to_string(),
        }]));
        let orchestrator = orchestrator(backend.clone(), engine);
        let mut rx = orchestrator.subscribe().await.unwrap();

        orchestrator.initiate("G2957839M").await.unwrap();
        let seen = collect_until_reset(&mut rx).await;

        assert!(matches!(
            &seen[0],
            VerificationNotification::Failed {
                error: VerificationError::TokenMismatch,
                ..
            }
        ));
        assert_eq!(backend.validate_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stream_ending_without_terminal_event_is_engine_fault() {
        let backend = Arc::new(FakeBackend::issuing("T1"));
        let engine = Arc::new(FakeEngine::scripted(vec![CaptureEvent::processing(
            0.2, "Scanning",
        )]));
        let orchestrator = orchestrator(backend, engine);
        let mut rx = orchestrator.subscribe().await.unwrap();

        orchestrator.initiate("G2957839M").await.unwrap();
        let seen = collect_until_reset(&mut rx).await;

        assert!(matches!(&seen[0], VerificationNotification::Progress { .. }));
        assert!(matches!(
            &seen[1],
            VerificationNotification::Failed {
                error: VerificationError::EngineFault(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn second_initiate_while_active_is_busy() {
        let backend = Arc::new(FakeBackend::issuing("T1"));
        let engine = Arc::new(FakeEngine::silent());
        let orchestrator = orchestrator(backend.clone(), engine);
        let mut rx = orchestrator.subscribe().await.unwrap();

        let first = orchestrator.initiate("G2957839M").await.unwrap();
        wait_for_phase(&orchestrator, SessionPhase::EngineActive).await;

        let second = orchestrator.initiate("S1234567D").await;
        assert!(matches!(
            second,
            Err(VerificationOrchestratorError::Rejected(
                VerificationError::SessionBusy
            ))
        ));
        assert_eq!(
            next_notification(&mut rx).await,
            VerificationNotification::SessionBusy
        );

        let state = orchestrator.current_state().await;
        assert_eq!(state.phase(), SessionPhase::EngineActive);
        assert!(state.is_current(&first));
        assert_eq!(backend.token_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn abandon_closes_capture_and_allows_new_attempt() {
        let backend = Arc::new(FakeBackend::issuing("T1"));
        let engine = Arc::new(FakeEngine::silent());
        let orchestrator = orchestrator(backend, engine.clone());
        let mut rx = orchestrator.subscribe().await.unwrap();

        let attempt_id = orchestrator.initiate("G2957839M").await.unwrap();
        wait_for_phase(&orchestrator, SessionPhase::EngineActive).await;

        orchestrator.abandon().await.unwrap();
        assert_eq!(
            next_notification(&mut rx).await,
            VerificationNotification::SessionReset {
                attempt_id,
                reason: ResetReason::Abandoned,
            }
        );
        assert_eq!(orchestrator.current_phase().await, SessionPhase::Idle);

        for _ in 0..200 {
            if engine.closed.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(engine.closed.load(Ordering::SeqCst));

        orchestrator.initiate("G2957839M").await.unwrap();
        wait_for_phase(&orchestrator, SessionPhase::EngineActive).await;
        assert_eq!(engine.starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn abandon_when_idle_is_noop() {
        let orchestrator = orchestrator(
            Arc::new(FakeBackend::issuing("T1")),
            Arc::new(FakeEngine::silent()),
        );
        let mut rx = orchestrator.subscribe().await.unwrap();

        orchestrator.abandon().await.unwrap();
        orchestrator.abandon().await.unwrap();

        assert_eq!(orchestrator.current_phase().await, SessionPhase::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn blank_subject_is_rejected_before_backend() {
        let mut backend = MockBackend::new();
        backend.expect_request_token().times(0);
        backend.expect_validate().times(0);
        let orchestrator = orchestrator(Arc::new(backend), Arc::new(FakeEngine::silent()));
        let mut rx = orchestrator.subscribe().await.unwrap();

        for input in ["", "   "] {
            let result = orchestrator.initiate(input).await;
            assert!(matches!(
                result,
                Err(VerificationOrchestratorError::Rejected(
                    VerificationError::Validation(_)
                ))
            ));
            assert!(matches!(
                next_notification(&mut rx).await,
                VerificationNotification::ValidationError { .. }
            ));
        }
        assert_eq!(orchestrator.current_phase().await, SessionPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn token_request_times_out_as_network_failure() {
        let backend = Arc::new(FakeBackend::hanging());
        let engine = Arc::new(FakeEngine::silent());
        let orchestrator = orchestrator(backend, engine.clone());
        let mut rx = orchestrator.subscribe().await.unwrap();

        orchestrator.initiate("G2957839M").await.unwrap();
        let seen = collect_until_reset(&mut rx).await;

        assert!(matches!(
            &seen[0],
            VerificationNotification::Failed {
                error: VerificationError::Network(cause),
                ..
            } if cause.contains("timed out")
        ));
        assert_eq!(engine.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_engine_fails_after_idle_timeout() {
        let config = VerificationConfig {
            streaming_endpoint: "wss://stream.test/v1".to_string(),
            call_timeout: Duration::from_secs(2),
            idle_timeout: Some(Duration::from_secs(5)),
        };
        let orchestrator = VerificationOrchestrator::spawn(
            config,
            Arc::new(FakeBackend::issuing("T1")),
            Arc::new(FakeEngine::silent()),
        );
        let mut rx = orchestrator.subscribe().await.unwrap();

        orchestrator.initiate("G2957839M").await.unwrap();
        let seen = collect_until_reset(&mut rx).await;

        assert!(matches!(
            &seen[0],
            VerificationNotification::Failed {
                error: VerificationError::EngineFault(detail),
                ..
            } if detail == "capture stream idle timeout"
        ));
    }

    #[tokio::test]
    async fn dropping_runtime_reports_stopped() {
        let (orchestrator, runtime) = VerificationOrchestrator::new(
            VerificationConfig::default(),
            Arc::new(FakeBackend::issuing("T1")),
            Arc::new(FakeEngine::silent()),
        );
        drop(runtime);

        let result = orchestrator.initiate("G2957839M").await;
        assert!(matches!(
            result,
            Err(VerificationOrchestratorError::RuntimeStopped)
        ));
    }
}
