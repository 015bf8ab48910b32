//! Configuration for backwatch
//!
//! Loaded from a TOML file; every field has a compiled-in default so a
//! partial file (or none at all) still yields a runnable configuration.
//! Tolerances and the reminder interval are whole day counts; the
//! engine re-validates the interval at scheduler construction.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::Deserialize;
use tracing::debug;

use crate::collect::DetectionRule;
use crate::error::{Error, Result};

/// Environment variable overriding the configured SMTP password, so the
/// secret can stay out of the config file.
pub const SMTP_PASSWORD_ENV: &str = "BACKWATCH_SMTP_PASSWORD";

const DEFAULT_ADMIN_REPORT: &str = "\
Outdated users:
{outdated_users}


Users with future files:
{future_users}


OK users:
{ok_users}
";

const DEFAULT_MAIL_OUTDATED: &str = "\
Dear user,

Your backup is outdated.

- Date of last backup:  {date_last_backup}  ({outdated_days} outdated)

Best regards,
backwatch
";

const DEFAULT_MAIL_FUTURE: &str = "\
Dear user,

Your backup contains at least one file whose modification time lies in
the future.

- File:  {path}
- Modification Time:  {date}

Because of this file, your backup can not be validated correctly.

Best regards,
backwatch
";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether Saturdays and Sundays count towards backup age.
    pub exclude_weekends: bool,
    /// Days a backup may lag behind before it is outdated.
    pub tolerance_outdated_days: i64,
    /// Days a timestamp may run ahead before it counts as future-dated.
    pub tolerance_future_days: i64,
    /// Business-day cadence of repeated outdated reminders.
    pub reminder_interval_days: i64,
    /// Whether affected users receive reminder mails.
    pub notify_users: bool,
    /// Usernames to skip entirely during collection.
    pub exclude_users: Vec<String>,
    /// Named home-directory detection rules.
    pub detection: BTreeMap<String, DetectionRule>,
    pub mail: MailConfig,
    pub templates: Templates,
}

impl Default for Config {
    fn default() -> Self {
        let mut detection = BTreeMap::new();
        detection.insert(
            "local".to_string(),
            DetectionRule {
                home_dirs_glob: "/home/[!.]*".to_string(),
                backup_subdir: "Backup".to_string(),
            },
        );
        Self {
            exclude_weekends: true,
            tolerance_outdated_days: 5,
            tolerance_future_days: 1,
            reminder_interval_days: 1,
            notify_users: false,
            exclude_users: Vec::new(),
            detection,
            mail: MailConfig::default(),
            templates: Templates::default(),
        }
    }
}

impl Config {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config: Config = toml::from_str(&raw).map_err(|e| {
            Error::Config(format!("cannot parse config file {}: {e}", path.display()))
        })?;
        config.validate()?;
        debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tolerance_outdated_days < 0 {
            return Err(Error::Config(
                "tolerance_outdated_days must not be negative".to_string(),
            ));
        }
        if self.tolerance_future_days < 0 {
            return Err(Error::Config(
                "tolerance_future_days must not be negative".to_string(),
            ));
        }
        if self.reminder_interval_days < 1 {
            return Err(Error::Config(
                "reminder_interval_days must be at least 1".to_string(),
            ));
        }
        if self.detection.is_empty() {
            return Err(Error::Config(
                "at least one [detection.<name>] rule is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tolerance_outdated(&self) -> Duration {
        Duration::days(self.tolerance_outdated_days)
    }

    pub fn tolerance_future(&self) -> Duration {
        Duration::days(self.tolerance_future_days)
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::days(self.reminder_interval_days)
    }
}

/// SMTP relay and addressing settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    /// Prefer the `BACKWATCH_SMTP_PASSWORD` environment variable over
    /// this field.
    pub smtp_password: Option<String>,
    /// Sender mailbox, e.g. `backwatch <no-reply@example.com>`.
    pub sender: String,
    /// Recipient address pattern; `{username}` is substituted per user.
    pub address_template: String,
    pub subject_outdated: String,
    pub subject_future: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: None,
            smtp_user: None,
            smtp_password: None,
            sender: "backwatch <no-reply@localhost>".to_string(),
            address_template: "{username}@localhost".to_string(),
            subject_outdated: "Your backup is outdated".to_string(),
            subject_future: "Your backup contains a file with future modification time".to_string(),
        }
    }
}

impl MailConfig {
    /// The SMTP password: environment variable first, config field second.
    pub fn resolve_password(&self) -> Option<String> {
        std::env::var(SMTP_PASSWORD_ENV)
            .ok()
            .or_else(|| self.smtp_password.clone())
    }
}

/// Report and mail body templates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Templates {
    pub admin_report: String,
    pub mail_outdated: String,
    pub mail_future: String,
}

impl Default for Templates {
    fn default() -> Self {
        Self {
            admin_report: DEFAULT_ADMIN_REPORT.to_string(),
            mail_outdated: DEFAULT_MAIL_OUTDATED.to_string(),
            mail_future: DEFAULT_MAIL_FUTURE.to_string(),
        }
    }
}
