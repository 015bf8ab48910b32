//! Test utilities: canned users and mail client doubles

use std::cell::RefCell;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::mail::MailClient;
use crate::models::{Snapshot, User};

/// A user whose newest backup file was modified at `modified`.
pub fn user(name: &str, modified: NaiveDateTime) -> User {
    User {
        username: name.to_string(),
        backup_dir: PathBuf::from(format!("/homes/{name}/Backup")),
        newest: Some(Snapshot {
            path: PathBuf::from(format!("/homes/{name}/Backup/newest.txt")),
            modified,
        }),
    }
}

/// A user with a backup directory but no files in it.
pub fn user_without_backups(name: &str) -> User {
    User {
        username: name.to_string(),
        backup_dir: PathBuf::from(format!("/homes/{name}/Backup")),
        newest: None,
    }
}

/// One captured `send` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMail {
    pub username: String,
    pub subject: String,
    pub body: String,
}

/// Mail client that records every send instead of delivering.
#[derive(Debug, Default)]
pub struct RecordingMailClient {
    pub sent: RefCell<Vec<SentMail>>,
}

impl MailClient for RecordingMailClient {
    fn address(&self, user: &User) -> Result<String> {
        Ok(format!("{}@example.test", user.username))
    }

    fn send(&self, user: &User, subject: &str, body: &str) -> Result<()> {
        self.sent.borrow_mut().push(SentMail {
            username: user.username.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Mail client whose every call fails, for propagation tests.
#[derive(Debug, Default)]
pub struct FailingMailClient;

impl MailClient for FailingMailClient {
    fn address(&self, user: &User) -> Result<String> {
        Err(Error::Mail(format!("no address for '{}'", user.username)))
    }

    fn send(&self, _user: &User, _subject: &str, _body: &str) -> Result<()> {
        Err(Error::Mail("smtp relay unavailable".to_string()))
    }
}
