//! Domain models for backwatch

use std::path::PathBuf;

use chrono::{Duration, NaiveDateTime};

use crate::workdays::time_between;

/// A user found on the file server, together with the most recent
/// activity discovered under their backup root.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Unique identifier; collation key for all sorting and deduplication.
    pub username: String,
    /// Root of the user's backup tree.
    pub backup_dir: PathBuf,
    /// Most recently modified file, or `None` when the backup root holds
    /// no files at all. Such users cannot be classified and are filtered
    /// out (with a warning) before reporting.
    pub newest: Option<Snapshot>,
}

/// The newest file in a backup tree: its path and modification time.
///
/// Path and timestamp always travel together; a user either has both
/// or has neither.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: PathBuf,
    pub modified: NaiveDateTime,
}

impl Snapshot {
    /// Whether this backup is older than `tolerance` relative to
    /// `reference`. A backup exactly `tolerance` old is not outdated.
    pub fn is_outdated(
        &self,
        reference: NaiveDateTime,
        tolerance: Duration,
        exclude_weekends: bool,
    ) -> bool {
        time_between(self.modified, reference, exclude_weekends) > tolerance
    }

    /// Whether this backup carries a timestamp beyond `reference` plus
    /// `tolerance`, typically a clock-skew or corruption symptom.
    pub fn is_in_future(
        &self,
        reference: NaiveDateTime,
        tolerance: Duration,
        exclude_weekends: bool,
    ) -> bool {
        time_between(reference, self.modified, exclude_weekends) > tolerance
    }
}
