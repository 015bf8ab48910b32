//! Backwatch core library
//!
//! Shared functionality for the backwatch backup-freshness auditor:
//! - Business-day time arithmetic
//! - User collection from configured home-directory globs
//! - Three-way backup status classification (outdated / future / ok)
//! - The aggregate admin report
//! - Stateless reminder scheduling and SMTP notification

pub mod collect;
pub mod config;
pub mod error;
pub mod mail;
pub mod models;
pub mod report;
pub mod schedule;
pub mod workdays;

/// Test utilities including canned users and mail client doubles
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use collect::{collect_users, newest_file, split_classifiable, Collection, DetectionRule};
pub use config::{Config, MailConfig, Templates, SMTP_PASSWORD_ENV};
pub use error::{Error, Result};
pub use mail::{MailClient, SmtpMailClient};
pub use models::{Snapshot, User};
pub use report::{Status, StatusReporter};
pub use schedule::ReminderScheduler;
pub use workdays::{is_weekend, next_monday, time_between};
