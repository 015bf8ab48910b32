//! Reminder delivery command (notify)

use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::{info, warn};

use backwatch_core::{Config, MailClient, SmtpMailClient, User};

use super::check::send_reminders;
use super::{build_reporter, RunOutcome};

/// Compute today's recipients and deliver the reminder mails. With
/// `dry_run`, the full scheduling and rendering path runs but each mail
/// is printed as a one-line notice instead of being delivered.
pub fn cmd_notify(config: &Config, reference: NaiveDateTime, dry_run: bool) -> Result<RunOutcome> {
    let Some((reporter, _warnings)) = build_reporter(config, reference)? else {
        warn!("no users found under the configured home globs");
        return Ok(RunOutcome::NoUsers);
    };

    if dry_run {
        send_reminders(&reporter, &DryRunMailer, config)?;
        return Ok(RunOutcome::Completed);
    }

    let mailer = SmtpMailClient::new(&config.mail)?;
    send_reminders(&reporter, &mailer, config)?;
    info!("reminder run complete");
    Ok(RunOutcome::Completed)
}

/// Sink for --dry-run: goes through the same scheduling and template
/// rendering as a real run, but prints instead of delivering.
struct DryRunMailer;

impl MailClient for DryRunMailer {
    fn address(&self, user: &User) -> backwatch_core::Result<String> {
        Ok(user.username.clone())
    }

    fn send(&self, user: &User, subject: &str, _body: &str) -> backwatch_core::Result<()> {
        println!("(dry run) would send '{}' to '{}'", subject, user.username);
        Ok(())
    }
}
