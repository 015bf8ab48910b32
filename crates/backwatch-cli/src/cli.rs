//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Backwatch - audit per-user backup freshness and send reminder mails
#[derive(Parser)]
#[command(name = "backwatch")]
#[command(about = "Per-user backup freshness auditor", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, default_value = "backwatch.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override "today" for classification and scheduling
    /// (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS; defaults to the current local time)
    #[arg(long, global = true)]
    pub reference_date: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect users, print the status report, and send due reminders
    Check {
        /// Skip sending mail even when notify_users is enabled
        #[arg(long)]
        no_notify: bool,
    },

    /// Print the status report only
    Report,

    /// Compute today's recipients and send reminder mails
    Notify {
        /// List recipients without sending anything
        #[arg(long)]
        dry_run: bool,
    },
}
