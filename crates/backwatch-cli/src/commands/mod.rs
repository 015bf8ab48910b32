//! CLI command implementations
//!
//! Commands are organized by concern:
//! - `check` - Combined status report plus due reminders (also report-only)
//! - `notify` - Reminder mail delivery and dry runs
//!
//! Shared helpers (config loading, reference-date resolution, reporter
//! construction) live here.

pub mod check;
pub mod notify;

pub use check::*;
pub use notify::*;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use backwatch_core::{collect_users, split_classifiable, Config, StatusReporter};

/// What a command run concluded; the process exit code derives from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Classification completed (possibly with zero outdated users).
    Completed,
    /// No users were found at all.
    NoUsers,
}

impl RunOutcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Completed => ExitCode::SUCCESS,
            Self::NoUsers => ExitCode::from(2),
        }
    }
}

/// Load the config file when it exists, otherwise fall back to the
/// compiled-in defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        debug!("config file {} not found, using defaults", path.display());
        Ok(Config::default())
    }
}

/// Parse the --reference-date override, or take the current local time.
pub fn resolve_reference_date(arg: Option<&str>) -> Result<NaiveDateTime> {
    let Some(raw) = arg else {
        return Ok(Local::now().naive_local());
    };
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
        })
        .map_err(|_| {
            anyhow!("invalid reference date '{raw}': expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")
        })
}

/// Collect and classify all users. Returns the reporter plus collection
/// warnings, or `None` when no users were found at all (the empty-set
/// case the surrounding process reports with exit code 2).
pub fn build_reporter(
    config: &Config,
    reference: NaiveDateTime,
) -> Result<Option<(StatusReporter, Vec<String>)>> {
    let collection = collect_users(&config.detection, &config.exclude_users)?;
    if collection.users.is_empty() {
        return Ok(None);
    }
    let (users, warnings) = split_classifiable(collection);
    let reporter = StatusReporter::new(
        users,
        reference,
        config.tolerance_outdated(),
        config.tolerance_future(),
        config.exclude_weekends,
    )?;
    Ok(Some((reporter, warnings)))
}
