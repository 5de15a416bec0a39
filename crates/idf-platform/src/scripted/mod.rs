//! Scripted capture engine.
//!
//! Plays a fixed sequence of native status callbacks on a background thread,
//! the way a real SDK reports from its own worker. Used by the `verify`
//! command and in tests.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::capture::{
    NativeCaptureEngine, NativeCaptureHandle, NativeCaptureUpdate, NativeStatusCallback,
};

const FOREIGN_TOKEN: &str = "FOREIGN-SESSION-TOKEN";
const PROGRESS_MESSAGES: [&str; 3] = ["Align your face", "Hold still", "Almost done"];

/// Terminal outcome the scripted engine reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureScript {
    /// Success carrying the token the session was launched with.
    Success,
    /// Success carrying a token from some other session.
    Mismatch,
    Failure(String),
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capture script '{0}', expected success, mismatch, failure:<code> or error:<detail>")]
pub struct ScriptParseError(String);

impl FromStr for CaptureScript {
    type Err = ScriptParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        match raw {
            "success" => return Ok(Self::Success),
            "mismatch" => return Ok(Self::Mismatch),
            _ => {}
        }
        match raw.split_once(':') {
            Some(("failure", code)) if !code.is_empty() => Ok(Self::Failure(code.to_string())),
            Some(("error", detail)) if !detail.is_empty() => Ok(Self::Error(detail.to_string())),
            _ => Err(ScriptParseError(raw.to_string())),
        }
    }
}

pub struct ScriptedCaptureEngine {
    script: CaptureScript,
    step_delay: Duration,
}

impl ScriptedCaptureEngine {
    pub fn new(script: CaptureScript) -> Self {
        Self {
            script,
            step_delay: Duration::from_millis(300),
        }
    }

    pub fn with_step_delay(mut self, step_delay: Duration) -> Self {
        self.step_delay = step_delay;
        self
    }

    fn updates(&self, token: &str) -> Vec<NativeCaptureUpdate> {
        let mut updates = vec![NativeCaptureUpdate::connecting()];
        let steps = PROGRESS_MESSAGES.len() as f64;
        for (index, message) in PROGRESS_MESSAGES.iter().enumerate() {
            updates.push(NativeCaptureUpdate::processing(
                (index + 1) as f64 / (steps + 1.0),
                *message,
            ));
        }
        updates.push(match &self.script {
            CaptureScript::Success => NativeCaptureUpdate::success(token),
            CaptureScript::Mismatch => NativeCaptureUpdate::success(FOREIGN_TOKEN),
            CaptureScript::Failure(code) => NativeCaptureUpdate::failure(code.clone()),
            CaptureScript::Error(detail) => NativeCaptureUpdate::error(detail.clone()),
        });
        updates
    }
}

struct ScriptedHandle {
    cancelled: Arc<AtomicBool>,
}

impl NativeCaptureHandle for ScriptedHandle {
    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl NativeCaptureEngine for ScriptedCaptureEngine {
    fn launch(
        &self,
        streaming_endpoint: &str,
        token: &str,
        on_status: NativeStatusCallback,
    ) -> anyhow::Result<Box<dyn NativeCaptureHandle>> {
        debug!(endpoint = streaming_endpoint, script = ?self.script, "launching scripted capture");

        let updates = self.updates(token);
        let step_delay = self.step_delay;
        let cancelled = Arc::new(AtomicBool::new(false));
        let worker_cancelled = cancelled.clone();

        thread::Builder::new()
            .name("scripted-capture".to_string())
            .spawn(move || {
                for update in updates {
                    thread::sleep(step_delay);
                    if worker_cancelled.load(Ordering::SeqCst) {
                        return;
                    }
                    on_status(update);
                }
            })?;

        Ok(Box::new(ScriptedHandle { cancelled }))
    }
}
