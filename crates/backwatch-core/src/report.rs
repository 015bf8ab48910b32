//! Status classification and the aggregate admin report
//!
//! `StatusReporter` partitions a fixed user set into three disjoint groups
//! (outdated, future-dated, ok) against a single reference date, then
//! renders the plain-text report sent to the administrator.

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::User;

/// Classification of one user relative to the reference date.
///
/// Exactly one status holds per user. When a single timestamp satisfies
/// both the future and the outdated predicate, `Future` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Future,
    Outdated,
    Ok,
}

/// Literal rendered in place of an empty group.
const EMPTY_GROUP: &str = "[None]";

/// Placeholders every report template must contain.
const REPORT_PLACEHOLDERS: [&str; 3] = ["{outdated_users}", "{future_users}", "{ok_users}"];

struct Entry {
    user: User,
    modified: NaiveDateTime,
    status: Status,
}

/// Classifies a user set once, at construction, and keeps the result for
/// its lifetime. The reference date is frozen: the reporter never
/// re-evaluates against a later "now".
pub struct StatusReporter {
    entries: Vec<Entry>,
    reference_date: NaiveDateTime,
    tolerance_outdated: Duration,
    tolerance_future: Duration,
    exclude_weekends: bool,
}

impl StatusReporter {
    /// Classify `users` against `reference_date`.
    ///
    /// Every user must carry a backup snapshot; the collector filters out
    /// users without one before classification. A user slipping through
    /// anyway is a contract violation and yields `Error::MissingTimestamp`
    /// rather than a silent misclassification.
    pub fn new(
        users: Vec<User>,
        reference_date: NaiveDateTime,
        tolerance_outdated: Duration,
        tolerance_future: Duration,
        exclude_weekends: bool,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(users.len());
        for user in users {
            let snapshot = user
                .newest
                .as_ref()
                .ok_or_else(|| Error::MissingTimestamp(user.username.clone()))?;
            let in_future =
                snapshot.is_in_future(reference_date, tolerance_future, exclude_weekends);
            let outdated =
                snapshot.is_outdated(reference_date, tolerance_outdated, exclude_weekends);
            let status = if in_future {
                Status::Future
            } else if outdated {
                Status::Outdated
            } else {
                Status::Ok
            };
            let modified = snapshot.modified;
            entries.push(Entry {
                user,
                modified,
                status,
            });
        }
        entries.sort_by(|a, b| a.user.username.cmp(&b.user.username));

        debug!(
            "classified {} users: {} outdated, {} future, {} ok",
            entries.len(),
            entries.iter().filter(|e| e.status == Status::Outdated).count(),
            entries.iter().filter(|e| e.status == Status::Future).count(),
            entries.iter().filter(|e| e.status == Status::Ok).count(),
        );

        Ok(Self {
            entries,
            reference_date,
            tolerance_outdated,
            tolerance_future,
            exclude_weekends,
        })
    }

    pub fn reference_date(&self) -> NaiveDateTime {
        self.reference_date
    }

    pub fn tolerance_outdated(&self) -> Duration {
        self.tolerance_outdated
    }

    pub fn tolerance_future(&self) -> Duration {
        self.tolerance_future
    }

    pub fn exclude_weekends(&self) -> bool {
        self.exclude_weekends
    }

    /// Users with outdated backups, sorted ascending by username.
    pub fn outdated_users(&self) -> Vec<User> {
        self.group(Status::Outdated)
    }

    /// Users with future-dated files, sorted ascending by username.
    pub fn future_users(&self) -> Vec<User> {
        self.group(Status::Future)
    }

    /// Users whose backups are current, sorted ascending by username.
    pub fn ok_users(&self) -> Vec<User> {
        self.group(Status::Ok)
    }

    fn group(&self, status: Status) -> Vec<User> {
        self.entries
            .iter()
            .filter(|e| e.status == status)
            .map(|e| e.user.clone())
            .collect()
    }

    /// Render the aggregate report.
    ///
    /// The template must contain the `{outdated_users}`, `{future_users}`
    /// and `{ok_users}` placeholders; each is replaced by one line per
    /// user (`- <username>  (<YYYY-MM-DD>)`, usernames padded to the
    /// longest username across all groups) or by `[None]` when the group
    /// is empty.
    pub fn render_report(&self, template: &str) -> Result<String> {
        for placeholder in REPORT_PLACEHOLDERS {
            if !template.contains(placeholder) {
                return Err(Error::Template(format!(
                    "report template is missing the {placeholder} placeholder"
                )));
            }
        }

        let width = self
            .entries
            .iter()
            .map(|e| e.user.username.len())
            .max()
            .unwrap_or(0);

        Ok(template
            .replace("{outdated_users}", &self.render_group(Status::Outdated, width))
            .replace("{future_users}", &self.render_group(Status::Future, width))
            .replace("{ok_users}", &self.render_group(Status::Ok, width)))
    }

    fn render_group(&self, status: Status, width: usize) -> String {
        let lines: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.status == status)
            .map(|e| {
                format!(
                    "- {:<width$}  ({})",
                    e.user.username,
                    e.modified.format("%Y-%m-%d"),
                )
            })
            .collect();
        if lines.is_empty() {
            EMPTY_GROUP.to_string()
        } else {
            lines.join("\n")
        }
    }
}
