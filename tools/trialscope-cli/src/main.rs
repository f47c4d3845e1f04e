//! Trialscope CLI — turn raw trial event logs into analysis-ready CSVs.
//!
//! Usage:
//!   trialscope kill-data-csv <PATH>     Emit one row per enemy kill
//!   trialscope touch-data-csv <PATH>    Emit one row per raw touch move
//!   trialscope info <FILE>              Show a trial's attributes
//!
//! <PATH> is a single trial log or a directory of them; directories are
//! processed in file-name order. CSV goes to standard output, logging to
//! standard error.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "trialscope",
    about = "Trial event-log reconstruction and CSV export",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit a CSV of enemy kill data for all trials
    KillDataCsv {
        /// Trial log file, or a directory of trial logs
        path: PathBuf,

        /// Stimulus script providing the wave metadata
        #[arg(long, default_value = "script/script.csv")]
        script: PathBuf,
    },

    /// Emit a CSV of touch contact data for all trials
    TouchDataCsv {
        /// Trial log file, or a directory of trial logs
        path: PathBuf,

        /// Stimulus script providing the wave metadata
        #[arg(long, default_value = "script/script.csv")]
        script: PathBuf,
    },

    /// Show a trial's attributes and event counts
    Info {
        /// Trial log file
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    trialscope_common::logging::init_logging(&trialscope_common::config::LoggingConfig {
        level: log_level.to_string(),
        json: false,
        file: None,
    });

    match cli.command {
        Commands::KillDataCsv { path, script } => {
            commands::export::run(path, script, trialscope_replay_core::OutputMode::KillData)
        }
        Commands::TouchDataCsv { path, script } => {
            commands::export::run(path, script, trialscope_replay_core::OutputMode::TouchData)
        }
        Commands::Info { path } => commands::info::run(path),
    }
}
