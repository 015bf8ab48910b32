//! Status report commands (check, report)

use anyhow::Result;
use chrono::NaiveDateTime;
use tracing::warn;

use backwatch_core::{Config, MailClient, ReminderScheduler, SmtpMailClient, StatusReporter};

use super::{build_reporter, RunOutcome};

/// Collect users, print the admin report, and send due reminders unless
/// notification is disabled.
pub fn cmd_check(config: &Config, reference: NaiveDateTime, no_notify: bool) -> Result<RunOutcome> {
    let Some((reporter, warnings)) = build_reporter(config, reference)? else {
        warn!("no users found under the configured home globs");
        return Ok(RunOutcome::NoUsers);
    };

    print_report(&reporter, config, &warnings)?;

    if config.notify_users && !no_notify {
        let mailer = SmtpMailClient::new(&config.mail)?;
        send_reminders(&reporter, &mailer, config)?;
    }

    Ok(RunOutcome::Completed)
}

/// Print the admin report only; never sends mail.
pub fn cmd_report(config: &Config, reference: NaiveDateTime) -> Result<RunOutcome> {
    let Some((reporter, warnings)) = build_reporter(config, reference)? else {
        warn!("no users found under the configured home globs");
        return Ok(RunOutcome::NoUsers);
    };
    print_report(&reporter, config, &warnings)?;
    Ok(RunOutcome::Completed)
}

fn print_report(reporter: &StatusReporter, config: &Config, warnings: &[String]) -> Result<()> {
    let report = reporter.render_report(&config.templates.admin_report)?;
    println!("{report}");
    if !warnings.is_empty() {
        println!("\nLog:");
        for warning in warnings {
            println!("- {warning}");
        }
    }
    Ok(())
}

/// Run the scheduler against the classification and push both mail kinds
/// through the given sink, outdated reminders first.
pub(super) fn send_reminders(
    reporter: &StatusReporter,
    mailer: &dyn MailClient,
    config: &Config,
) -> Result<()> {
    let scheduler = ReminderScheduler::new(reporter, mailer, config.reminder_interval())?;
    scheduler.notify_outdated_recipients(
        &config.mail.subject_outdated,
        &config.templates.mail_outdated,
    )?;
    scheduler.notify_future_recipients(
        &config.mail.subject_future,
        &config.templates.mail_future,
    )?;
    Ok(())
}
