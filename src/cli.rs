use std::path::PathBuf;

use clap::{Parser, Subcommand};

use idf_platform::CaptureScript;

#[derive(Debug, Parser)]
#[command(name = "identiface")]
#[command(about = "Face verification against an identity backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one verification attempt for a subject (NRIC/FIN)
    Verify {
        /// Subject identifier
        subject: String,
        /// Config file path, defaults to <config dir>/identiface/config.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Outcome the scripted capture engine reports:
        /// success, mismatch, failure:<code> or error:<detail>
        #[arg(short, long, default_value = "success")]
        script: CaptureScript,
    },
    /// Print the user-facing message for a denial reason code
    Feedback {
        /// Reason code, e.g. ambiguous_outcome
        code: String,
    },
}
