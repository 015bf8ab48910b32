//! Backwatch CLI - per-user backup freshness auditor
//!
//! Usage:
//!   backwatch check              Collect users, print the status report, send due reminders
//!   backwatch report             Print the status report only
//!   backwatch notify --dry-run   Show who would receive mail today
//!
//! Exit codes:
//!   0: Classification completed successfully.
//!   2: No user found under the configured home globs.

mod cli;
mod commands;


use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<commands::RunOutcome> {
    let config = commands::load_config(&cli.config)?;
    let reference = commands::resolve_reference_date(cli.reference_date.as_deref())?;

    match cli.command {
        Commands::Check { no_notify } => commands::cmd_check(&config, reference, no_notify),
        Commands::Report => commands::cmd_report(&config, reference),
        Commands::Notify { dry_run } => commands::cmd_notify(&config, reference, dry_run),
    }
}
