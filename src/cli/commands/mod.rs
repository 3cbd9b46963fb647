//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod backends;
mod check;
mod compare;
mod config_cmd;
mod ocr;
mod readability;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use crate::config::Config;
use crate::quality::{BlurStrategy, DocumentSize, ErrorReport, QualityError};

#[derive(Parser)]
#[command(name = "scanlens")]
#[command(about = "Document image readability scoring and OCR backend comparison")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Quality-only check: brightness, contrast and blur
    Check {
        /// Image file to check
        file: PathBuf,
        /// Blur estimator (default from config: variance)
        #[arg(short, long, value_enum)]
        estimator: Option<BlurStrategy>,
        /// Blur threshold (overrides config)
        #[arg(short, long)]
        threshold: Option<f32>,
        /// Minimum image size as WIDTHxHEIGHT (e.g. 800x500)
        #[arg(long)]
        min_size: Option<DocumentSize>,
        /// Print JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Run OCR and score how readable the image is
    Readability {
        /// Image file to assess
        file: PathBuf,
        /// OCR backend, or comma-separated fallback chain (e.g. gemini,tesseract)
        #[arg(short, long)]
        backend: Option<String>,
        /// Minimum image size as WIDTHxHEIGHT
        #[arg(long)]
        min_size: Option<DocumentSize>,
        /// Minimum OCR confidence (0-100) to count as readable
        #[arg(long)]
        min_confidence: Option<f32>,
        /// Minimum extracted text length to count as readable
        #[arg(long)]
        min_text_length: Option<usize>,
        /// Print JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Extract text with a single OCR backend
    Ocr {
        /// Image file to OCR
        file: PathBuf,
        /// OCR backend or fallback chain (default: first configured)
        #[arg(short, long)]
        backend: Option<String>,
        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Run the blur analyzer and several OCR backends on one image
    Compare {
        /// Image file to compare on
        file: PathBuf,
        /// Backends to compare (e.g. tesseract,gemini,textract)
        #[arg(short, long)]
        backends: Option<String>,
        /// Print JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },

    /// Show which OCR backends are available
    Backends,

    /// Print the effective configuration
    Config,
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Commands::Check { json, .. }
            | Commands::Readability { json, .. }
            | Commands::Ocr { json, .. }
            | Commands::Compare { json, .. } => *json,
            Commands::Backends | Commands::Config => false,
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path)
            .await
            .map_err(|e| anyhow::anyhow!(e))?,
        None => Config::load().await,
    };

    let json = cli.command.wants_json();

    let result = match cli.command {
        Commands::Check {
            file,
            estimator,
            threshold,
            min_size,
            json,
        } => check::cmd_check(&config, &file, estimator, threshold, min_size, json).await,
        Commands::Readability {
            file,
            backend,
            min_size,
            min_confidence,
            min_text_length,
            json,
        } => {
            let overrides = readability::Overrides {
                min_size,
                min_confidence,
                min_text_length,
            };
            readability::cmd_readability(&config, &file, backend.as_deref(), overrides, json).await
        }
        Commands::Ocr {
            file,
            backend,
            json,
        } => ocr::cmd_ocr(&config, &file, backend.as_deref(), json).await,
        Commands::Compare {
            file,
            backends,
            json,
        } => compare::cmd_compare(&config, &file, backends.as_deref(), json).await,
        Commands::Backends => backends::cmd_backends(&config).await,
        Commands::Config => config_cmd::cmd_config_show(&config).await,
    };

    if let Err(e) = result {
        report_failure(&e, json);
        std::process::exit(FAILURE_EXIT_CODE);
    }
    Ok(())
}

/// Exit status for any failed command.
const FAILURE_EXIT_CODE: i32 = 1;

/// Build the `{ success: false, error }` body for a failed command.
fn failure_report(err: &anyhow::Error) -> ErrorReport {
    match err.downcast_ref::<QualityError>() {
        Some(quality_err) => ErrorReport::from(quality_err),
        None => ErrorReport::new(format!("{:#}", err)),
    }
}

/// Print a failure in the requested output mode.
fn report_failure(err: &anyhow::Error, json: bool) {
    if json {
        match serde_json::to_string_pretty(&failure_report(err)) {
            Ok(out) => println!("{}", out),
            Err(_) => eprintln!("{} {:#}", style("✗").red(), err),
        }
    } else {
        eprintln!("{} {:#}", style("✗").red(), err);
    }
}
