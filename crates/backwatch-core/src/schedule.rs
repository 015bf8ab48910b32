//! Reminder scheduling and user notification
//!
//! Decides, from nothing but the classification and today's date, whether
//! a reminder mail is due; no record of previously sent mail exists
//! anywhere. The day a user's backup first exceeded the outdated
//! tolerance is reconstructed from scratch on every run; reminders recur
//! a fixed number of business days after that day, so a run-once-per-day
//! cron job produces the same cadence a persisted "last sent" timestamp
//! would.

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::mail::MailClient;
use crate::models::User;
use crate::report::StatusReporter;
use crate::workdays::{is_weekend, time_between};

/// Placeholders required in the outdated-user mail template.
const OUTDATED_PLACEHOLDERS: [&str; 2] = ["{date_last_backup}", "{outdated_days}"];

/// Placeholders required in the future-user mail template.
const FUTURE_PLACEHOLDERS: [&str; 2] = ["{path}", "{date}"];

/// Computes reminder recipients from a [`StatusReporter`] classification
/// and delivers the rendered mails through an injected [`MailClient`].
pub struct ReminderScheduler<'a> {
    reporter: &'a StatusReporter,
    mailer: &'a dyn MailClient,
    interval: Duration,
}

impl<'a> ReminderScheduler<'a> {
    /// Create a scheduler with the given reminder interval.
    ///
    /// The interval must be a positive whole number of days; anything
    /// else is a configuration error and fails here, never silently
    /// coerced.
    pub fn new(
        reporter: &'a StatusReporter,
        mailer: &'a dyn MailClient,
        interval: Duration,
    ) -> Result<Self> {
        if interval <= Duration::zero() {
            return Err(Error::Config(
                "reminder interval must be positive".to_string(),
            ));
        }
        if interval != Duration::days(interval.num_days()) {
            return Err(Error::Config(
                "reminder interval must be a whole number of days".to_string(),
            ));
        }
        Ok(Self {
            reporter,
            mailer,
            interval,
        })
    }

    /// Users to be notified about future-dated files. Sent every day the
    /// condition holds, with no throttling.
    pub fn future_recipients(&self) -> Vec<User> {
        if self.suppressed_today() {
            return Vec::new();
        }
        self.reporter.future_users()
    }

    /// Outdated users whose reminder is due today.
    pub fn outdated_recipients(&self) -> Vec<User> {
        if self.suppressed_today() {
            return Vec::new();
        }
        self.reporter
            .outdated_users()
            .into_iter()
            .filter(|user| self.is_mail_due(user))
            .collect()
    }

    /// No mail goes out at all on weekend runs when weekends are excluded
    /// from counting; the whole run is a no-op, not a per-user decision.
    fn suppressed_today(&self) -> bool {
        self.reporter.exclude_weekends() && is_weekend(self.reporter.reference_date())
    }

    /// The day the user's backup age first exceeded the outdated
    /// tolerance, reconstructed by advancing a probe from the last backup
    /// one day at a time. The probe is floored to a date: a reminder day
    /// is a calendar day, not an instant.
    fn first_due_date(&self, user: &User) -> Option<NaiveDate> {
        let newest = user.newest.as_ref()?;
        let exclude = self.reporter.exclude_weekends();
        let tolerance = self.reporter.tolerance_outdated();
        let mut probe = newest.modified;
        while time_between(newest.modified, probe, exclude) <= tolerance {
            probe += Duration::days(1);
        }
        Some(probe.date())
    }

    /// Whether a reminder is due today: on the first-due day itself, and
    /// every `interval` elapsed (business) days after it, forever.
    fn is_mail_due(&self, user: &User) -> bool {
        let Some(first_due) = self.first_due_date(user) else {
            return false;
        };
        let today = self.reporter.reference_date().date();
        if today < first_due {
            return false;
        }
        if today == first_due {
            return true;
        }
        let elapsed = time_between(
            first_due.and_time(NaiveTime::MIN),
            today.and_time(NaiveTime::MIN),
            self.reporter.exclude_weekends(),
        );
        elapsed.num_days() % self.interval.num_days() == 0
    }

    /// Send the outdated-backup reminder to every due recipient, in
    /// username order. Delivery failures propagate immediately; the next
    /// daily run recomputes the same recipients, so a failed send retries
    /// itself naturally tomorrow.
    pub fn notify_outdated_recipients(&self, subject: &str, template: &str) -> Result<()> {
        check_placeholders(template, &OUTDATED_PLACEHOLDERS)?;
        let exclude = self.reporter.exclude_weekends();
        let unit = if exclude { "weekdays" } else { "days" };
        for user in self.outdated_recipients() {
            let Some(newest) = user.newest.as_ref() else {
                continue;
            };
            let age = time_between(newest.modified, self.reporter.reference_date(), exclude);
            let body = template
                .replace(
                    "{date_last_backup}",
                    &newest.modified.format("%Y-%m-%d").to_string(),
                )
                .replace("{outdated_days}", &format!("{} {}", age.num_days(), unit));
            info!("sending outdated-backup reminder to '{}'", user.username);
            self.mailer.send(&user, subject, &body)?;
        }
        Ok(())
    }

    /// Send the future-dated-file notice to every affected user, in
    /// username order.
    pub fn notify_future_recipients(&self, subject: &str, template: &str) -> Result<()> {
        check_placeholders(template, &FUTURE_PLACEHOLDERS)?;
        for user in self.future_recipients() {
            let Some(newest) = user.newest.as_ref() else {
                continue;
            };
            let body = template
                .replace("{path}", &newest.path.display().to_string())
                .replace(
                    "{date}",
                    &newest.modified.format("%Y-%m-%d %H:%M:%S").to_string(),
                );
            info!("sending future-file notice to '{}'", user.username);
            self.mailer.send(&user, subject, &body)?;
        }
        Ok(())
    }
}

fn check_placeholders(template: &str, required: &[&str]) -> Result<()> {
    for placeholder in required {
        if !template.contains(placeholder) {
            return Err(Error::Template(format!(
                "mail template is missing the {placeholder} placeholder"
            )));
        }
    }
    debug!("mail template placeholders present");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{user, FailingMailClient, RecordingMailClient};
    use chrono::{NaiveDate, NaiveDateTime};

    const OUTDATED_TEMPLATE: &str =
        "Last backup: {date_last_backup} ({outdated_days} outdated)";
    const FUTURE_TEMPLATE: &str = "File: {path} modified {date}";

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn reporter_for(users: Vec<User>, reference: NaiveDateTime) -> StatusReporter {
        StatusReporter::new(
            users,
            reference,
            Duration::days(5),
            Duration::days(5),
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_interval_must_be_whole_days() {
        let reporter = reporter_for(vec![], dt(2023, 8, 10));
        let mailer = RecordingMailClient::default();
        let result = ReminderScheduler::new(&reporter, &mailer, Duration::hours(36));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_interval_must_be_positive() {
        let reporter = reporter_for(vec![], dt(2023, 8, 10));
        let mailer = RecordingMailClient::default();
        for interval in [Duration::zero(), Duration::days(-3)] {
            let result = ReminderScheduler::new(&reporter, &mailer, interval);
            assert!(matches!(result, Err(Error::Config(_))));
        }
    }

    #[test]
    fn test_first_reminder_fires_right_after_tolerance() {
        // Backup on Wednesday 2023-08-02 with a five-weekday tolerance:
        // the sixth weekday is Thursday 2023-08-10.
        let reporter = reporter_for(vec![user("late", dt(2023, 8, 2))], dt(2023, 8, 10));
        let mailer = RecordingMailClient::default();
        let scheduler = ReminderScheduler::new(&reporter, &mailer, Duration::days(5)).unwrap();
        let recipients = scheduler.outdated_recipients();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].username, "late");
    }

    #[test]
    fn test_reminder_cadence_every_three_weekdays() {
        // Backup on Tuesday 2023-08-15, tolerance five weekdays, reminders
        // every three weekdays: first due Wednesday 2023-08-23, then
        // Monday 2023-08-28 and Thursday 2023-08-31.
        let expectations = [
            (22, false), // tolerance not yet exceeded
            (23, true),
            (24, false),
            (25, false),
            (26, false), // Saturday: run suppressed entirely
            (27, false), // Sunday: run suppressed entirely
            (28, true),
            (29, false),
            (30, false),
            (31, true),
        ];
        for (day, due) in expectations {
            let reporter =
                reporter_for(vec![user("carol", dt(2023, 8, 15))], dt(2023, 8, day));
            let mailer = RecordingMailClient::default();
            let scheduler =
                ReminderScheduler::new(&reporter, &mailer, Duration::days(3)).unwrap();
            assert_eq!(
                !scheduler.outdated_recipients().is_empty(),
                due,
                "wrong decision on 2023-08-{day:02}"
            );
        }
    }

    #[test]
    fn test_weekend_run_suppresses_all_mail() {
        // Saturday run: both lists empty although both users qualify.
        let users = vec![user("ancient", dt(2000, 1, 1)), user("skewed", dt(2030, 1, 1))];
        let reporter = reporter_for(users, dt(2023, 8, 26));
        let mailer = RecordingMailClient::default();
        let scheduler = ReminderScheduler::new(&reporter, &mailer, Duration::days(1)).unwrap();
        assert!(scheduler.outdated_recipients().is_empty());
        assert!(scheduler.future_recipients().is_empty());

        scheduler
            .notify_outdated_recipients("subject", OUTDATED_TEMPLATE)
            .unwrap();
        scheduler
            .notify_future_recipients("subject", FUTURE_TEMPLATE)
            .unwrap();
        assert!(mailer.sent.borrow().is_empty());
    }

    #[test]
    fn test_future_notices_sent_every_day() {
        // Unlike outdated reminders, future notices have no cadence.
        for day in [14, 15, 16, 17, 18] {
            let reporter = reporter_for(vec![user("skewed", dt(2030, 1, 1))], dt(2023, 8, day));
            let mailer = RecordingMailClient::default();
            let scheduler =
                ReminderScheduler::new(&reporter, &mailer, Duration::days(7)).unwrap();
            assert_eq!(scheduler.future_recipients().len(), 1);
        }
    }

    #[test]
    fn test_notify_outdated_renders_template() {
        let reporter = reporter_for(vec![user("late", dt(2023, 8, 2))], dt(2023, 8, 10));
        let mailer = RecordingMailClient::default();
        let scheduler = ReminderScheduler::new(&reporter, &mailer, Duration::days(5)).unwrap();
        scheduler
            .notify_outdated_recipients("Backup outdated", OUTDATED_TEMPLATE)
            .unwrap();

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].username, "late");
        assert_eq!(sent[0].subject, "Backup outdated");
        assert_eq!(sent[0].body, "Last backup: 2023-08-02 (6 weekdays outdated)");
    }

    #[test]
    fn test_notify_future_renders_template() {
        let reporter = reporter_for(vec![user("skewed", dt(2030, 1, 1))], dt(2023, 8, 10));
        let mailer = RecordingMailClient::default();
        let scheduler = ReminderScheduler::new(&reporter, &mailer, Duration::days(5)).unwrap();
        scheduler
            .notify_future_recipients("Future file", FUTURE_TEMPLATE)
            .unwrap();

        let sent = mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].username, "skewed");
        assert_eq!(
            sent[0].body,
            "File: /homes/skewed/Backup/newest.txt modified 2030-01-01 00:00:00"
        );
    }

    #[test]
    fn test_notify_sends_in_username_order() {
        let users = vec![
            user("zeta", dt(2000, 1, 3)),
            user("alpha", dt(2000, 1, 4)),
            user("mike", dt(2000, 1, 5)),
        ];
        let reporter = reporter_for(users, dt(2023, 8, 10));
        let mailer = RecordingMailClient::default();
        let scheduler = ReminderScheduler::new(&reporter, &mailer, Duration::days(1)).unwrap();
        scheduler
            .notify_outdated_recipients("subject", OUTDATED_TEMPLATE)
            .unwrap();

        let sent = mailer.sent.borrow();
        let order: Vec<&str> = sent.iter().map(|m| m.username.as_str()).collect();
        assert_eq!(order, ["alpha", "mike", "zeta"]);
    }

    #[test]
    fn test_missing_placeholder_is_fatal() {
        let reporter = reporter_for(vec![user("late", dt(2023, 8, 2))], dt(2023, 8, 10));
        let mailer = RecordingMailClient::default();
        let scheduler = ReminderScheduler::new(&reporter, &mailer, Duration::days(5)).unwrap();
        let result = scheduler.notify_outdated_recipients("subject", "{date_last_backup} only");
        assert!(matches!(result, Err(Error::Template(_))));
        assert!(mailer.sent.borrow().is_empty());
    }

    #[test]
    fn test_sink_failure_propagates() {
        let reporter = reporter_for(vec![user("late", dt(2023, 8, 2))], dt(2023, 8, 10));
        let mailer = FailingMailClient;
        let scheduler = ReminderScheduler::new(&reporter, &mailer, Duration::days(5)).unwrap();
        let result = scheduler.notify_outdated_recipients("subject", OUTDATED_TEMPLATE);
        assert!(matches!(result, Err(Error::Mail(_))));
    }

    #[test]
    fn test_no_users_no_mail() {
        let reporter = reporter_for(vec![], dt(2023, 8, 10));
        let mailer = RecordingMailClient::default();
        let scheduler = ReminderScheduler::new(&reporter, &mailer, Duration::days(1)).unwrap();
        assert!(scheduler.outdated_recipients().is_empty());
        assert!(scheduler.future_recipients().is_empty());
        scheduler
            .notify_outdated_recipients("subject", OUTDATED_TEMPLATE)
            .unwrap();
        scheduler
            .notify_future_recipients("subject", FUTURE_TEMPLATE)
            .unwrap();
        assert!(mailer.sent.borrow().is_empty());
    }
}
