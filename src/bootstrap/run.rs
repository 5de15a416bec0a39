//! Command execution for the `identiface` binary.

use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing::{info, warn};

use idf_app::{VerificationEventPort, VerificationOrchestrator};
use idf_core::verification::{feedback_for, welcome_message, FeedbackMessage, ResetReason};
use idf_core::VerificationNotification;
use idf_platform::CaptureScript;

use super::config::resolve_config;
use super::tracing::init_tracing_subscriber;
use super::wiring::build_orchestrator;
use crate::cli::{Cli, Commands};

/// How an attempt ended, as seen by the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Granted,
    Denied,
    Failed,
    Abandoned,
}

impl AttemptOutcome {
    fn exit_code(self) -> ExitCode {
        match self {
            Self::Granted => ExitCode::SUCCESS,
            Self::Denied | Self::Failed | Self::Abandoned => ExitCode::FAILURE,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Verify {
            subject,
            config,
            script,
        } => verify(&subject, config.as_deref(), script).await,
        Commands::Feedback { code } => {
            for line in feedback_lines(&feedback_for(&code)) {
                println!("{line}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn verify(
    subject: &str,
    config_path: Option<&std::path::Path>,
    script: CaptureScript,
) -> anyhow::Result<ExitCode> {
    let config = resolve_config(config_path)?;
    init_tracing_subscriber(config.logging.file_logging)
        .context("failed to initialize tracing")?;

    let orchestrator = build_orchestrator(&config, script)?;
    let mut notifications = orchestrator.subscribe().await?;

    let attempt_id = match orchestrator.initiate(subject).await {
        Ok(attempt_id) => attempt_id,
        Err(err) => {
            println!("{err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    info!(attempt_id = %attempt_id, "verification started");

    let outcome = follow_attempt(&orchestrator, &mut notifications).await?;
    Ok(outcome.exit_code())
}

/// Prints notifications until the attempt ends. Ctrl-C abandons the attempt.
async fn follow_attempt(
    orchestrator: &VerificationOrchestrator,
    notifications: &mut tokio::sync::mpsc::Receiver<VerificationNotification>,
) -> anyhow::Result<AttemptOutcome> {
    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    bail!("verification runtime stopped before the attempt ended");
                };
                for line in render(&notification) {
                    println!("{line}");
                }
                if let Some(outcome) = outcome_of(&notification) {
                    return Ok(outcome);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!(error = %err, "failed to listen for ctrl-c");
                }
                orchestrator.abandon().await?;
            }
        }
    }
}

/// Lines shown for a notification.
pub fn render(notification: &VerificationNotification) -> Vec<String> {
    match notification {
        VerificationNotification::Progress {
            progress, message, ..
        } => vec![format!("[{:>3.0}%] {message}", progress * 100.0)],
        VerificationNotification::Granted { subject, .. } => {
            vec![welcome_message(subject.as_str())]
        }
        VerificationNotification::Denied { reason, .. } => {
            feedback_lines(&feedback_for(reason.code()))
        }
        VerificationNotification::Failed { error, .. } => {
            vec![format!("Verification failed: {error}")]
        }
        VerificationNotification::SessionBusy => {
            vec!["A verification is already in progress.".to_string()]
        }
        VerificationNotification::ValidationError { detail } => {
            vec![format!("Invalid input: {detail}")]
        }
        VerificationNotification::SessionReset {
            reason: ResetReason::Abandoned,
            ..
        } => vec!["Verification cancelled.".to_string()],
        VerificationNotification::SessionReset { .. } => Vec::new(),
    }
}

fn outcome_of(notification: &VerificationNotification) -> Option<AttemptOutcome> {
    match notification {
        VerificationNotification::Granted { .. } => Some(AttemptOutcome::Granted),
        VerificationNotification::Denied { .. } => Some(AttemptOutcome::Denied),
        VerificationNotification::Failed { .. } => Some(AttemptOutcome::Failed),
        VerificationNotification::SessionReset {
            reason: ResetReason::Abandoned,
            ..
        } => Some(AttemptOutcome::Abandoned),
        _ => None,
    }
}

fn feedback_lines(feedback: &FeedbackMessage) -> Vec<String> {
    vec![
        feedback.title.to_string(),
        feedback.message.to_string(),
        format!("[{}]", feedback.actions.join("] [")),
    ]
}
