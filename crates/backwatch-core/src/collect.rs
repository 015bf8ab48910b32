//! User collection: home-directory discovery and newest-file lookup
//!
//! Detection rules pair a home-directory glob with the backup subtree
//! inside each home. Users whose backup dir is missing are reported as
//! warnings and skipped; the same username surfacing from two rules is a
//! fatal error, never a silent merge.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::models::{Snapshot, User};

/// One way of locating user homes on the server.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionRule {
    /// Glob matching the home directories, e.g. `/home/[!.]*`.
    pub home_dirs_glob: String,
    /// Path of the backup tree relative to each home directory.
    pub backup_subdir: String,
}

/// Result of a collection run: the users found, plus per-user warnings
/// for homes that could not be fully resolved.
#[derive(Debug, Default)]
pub struct Collection {
    pub users: Vec<User>,
    pub warnings: Vec<String>,
}

/// Discover users under every detection rule.
///
/// Usernames listed in `exclude` are skipped. The returned users are
/// sorted by username; users whose backup directory exists but holds no
/// files carry `newest: None`.
pub fn collect_users(
    rules: &BTreeMap<String, DetectionRule>,
    exclude: &[String],
) -> Result<Collection> {
    let mut users: BTreeMap<String, User> = BTreeMap::new();
    let mut warnings = Vec::new();

    for (rule_name, rule) in rules {
        debug!("collecting users via rule '{rule_name}'");
        for home in glob::glob(&rule.home_dirs_glob)? {
            let home = home?;
            if !home.is_dir() {
                continue;
            }
            let Some(username) = home.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            if exclude.iter().any(|e| e == &username) {
                debug!("skipping excluded user '{username}'");
                continue;
            }

            let backup_dir = home.join(&rule.backup_subdir);
            if !backup_dir.is_dir() {
                let message = format!(
                    "Backup dir not found (user '{}'): '{}'",
                    username,
                    backup_dir.display()
                );
                warn!("{message}");
                warnings.push(message);
                continue;
            }

            if users.contains_key(&username) {
                return Err(Error::DuplicateUser(username));
            }
            let newest = newest_file(&backup_dir)?;
            users.insert(
                username.clone(),
                User {
                    username,
                    backup_dir,
                    newest,
                },
            );
        }
    }

    Ok(Collection {
        users: users.into_values().collect(),
        warnings,
    })
}

/// The most recently modified file under `dir`, or `None` for an empty
/// tree. Symlinks are not followed and their own metadata is used.
///
/// A file vanishing between listing and stat means the tree was touched
/// while we walked it; that counts as activity happening right now.
pub fn newest_file(dir: &Path) -> Result<Option<Snapshot>> {
    let mut newest: Option<Snapshot> = None;
    for entry in WalkDir::new(dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| dir.to_path_buf());
                return Ok(Some(Snapshot {
                    path,
                    modified: Local::now().naive_local(),
                }));
            }
            Err(err) => return Err(err.into()),
        };
        if entry.file_type().is_dir() {
            continue;
        }
        // With follow_links off this is the entry's own metadata, so a
        // symlink contributes its link timestamp, not its target's.
        let modified = entry.metadata()?.modified()?;
        let modified = DateTime::<Local>::from(modified).naive_local();
        if newest.as_ref().map_or(true, |n| modified > n.modified) {
            newest = Some(Snapshot {
                path: entry.into_path(),
                modified,
            });
        }
    }
    Ok(newest)
}

/// Split collected users into the classifiable set and warnings for the
/// ones without any backup files. Classification predicates must never
/// see a user without a timestamp.
pub fn split_classifiable(collection: Collection) -> (Vec<User>, Vec<String>) {
    let mut warnings = collection.warnings;
    let mut classifiable = Vec::with_capacity(collection.users.len());
    for user in collection.users {
        if user.newest.is_some() {
            classifiable.push(user);
        } else {
            let message = format!(
                "No backup files found (user '{}'): '{}'",
                user.username,
                user.backup_dir.display()
            );
            warn!("{message}");
            warnings.push(message);
        }
    }
    (classifiable, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, TimeZone};
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn set_mtime(path: &Path, at: NaiveDateTime) {
        let stamp = Local.from_local_datetime(&at).unwrap();
        let system_time =
            SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(stamp.timestamp() as u64);
        let file = fs::OpenOptions::new().append(true).open(path).unwrap();
        file.set_modified(system_time).unwrap();
    }

    fn write_file(path: &Path, at: NaiveDateTime) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"data").unwrap();
        set_mtime(path, at);
    }

    /// Home tree with two users: alice (files from 2020) and bob
    /// (backup dir present but empty).
    fn seed_homes(root: &Path) {
        let alice = root.join("homes/alice/Backup");
        write_file(&alice.join("Documents/old.txt"), dt(2020, 1, 1));
        write_file(&alice.join("Documents/newest.txt"), dt(2020, 1, 15));
        write_file(&alice.join("Desktop/mid.txt"), dt(2020, 1, 8));
        fs::create_dir_all(root.join("homes/bob/Backup")).unwrap();
    }

    fn rules_for(root: &Path) -> BTreeMap<String, DetectionRule> {
        let mut rules = BTreeMap::new();
        rules.insert(
            "local".to_string(),
            DetectionRule {
                home_dirs_glob: format!("{}/homes/[!@.]*", root.display()),
                backup_subdir: "Backup".to_string(),
            },
        );
        rules
    }

    #[test]
    fn test_newest_file_discovery() {
        let dir = TempDir::new().unwrap();
        seed_homes(dir.path());

        let backup = dir.path().join("homes/alice/Backup");
        let newest = newest_file(&backup).unwrap().unwrap();
        assert_eq!(newest.modified, dt(2020, 1, 15));
        assert_eq!(newest.path, backup.join("Documents/newest.txt"));
    }

    #[test]
    fn test_newest_file_empty_tree() {
        let dir = TempDir::new().unwrap();
        assert!(newest_file(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_collect_users() {
        let dir = TempDir::new().unwrap();
        seed_homes(dir.path());

        let collection = collect_users(&rules_for(dir.path()), &[]).unwrap();
        let names: Vec<&str> = collection
            .users
            .iter()
            .map(|u| u.username.as_str())
            .collect();
        assert_eq!(names, ["alice", "bob"]);
        assert!(collection.warnings.is_empty());

        let alice = &collection.users[0];
        assert_eq!(alice.newest.as_ref().unwrap().modified, dt(2020, 1, 15));
        let bob = &collection.users[1];
        assert!(bob.newest.is_none());
    }

    #[test]
    fn test_collect_warns_about_missing_backup_dir() {
        let dir = TempDir::new().unwrap();
        seed_homes(dir.path());
        fs::create_dir_all(dir.path().join("homes/carol")).unwrap();

        let collection = collect_users(&rules_for(dir.path()), &[]).unwrap();
        assert_eq!(collection.users.len(), 2);
        assert_eq!(collection.warnings.len(), 1);
        assert!(collection.warnings[0].starts_with("Backup dir not found (user 'carol')"));
    }

    #[test]
    fn test_collect_skips_excluded_and_hidden_users() {
        let dir = TempDir::new().unwrap();
        seed_homes(dir.path());
        write_file(
            &dir.path().join("homes/.hidden/Backup/file.txt"),
            dt(2020, 1, 1),
        );
        write_file(
            &dir.path().join("homes/@system/Backup/file.txt"),
            dt(2020, 1, 1),
        );

        let collection =
            collect_users(&rules_for(dir.path()), &["bob".to_string()]).unwrap();
        let names: Vec<&str> = collection
            .users
            .iter()
            .map(|u| u.username.as_str())
            .collect();
        assert_eq!(names, ["alice"]);
    }

    #[test]
    fn test_duplicate_username_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir.path().join("homes/alice/Backup/a.txt"),
            dt(2020, 1, 1),
        );
        write_file(
            &dir.path().join("other/alice/Backup/b.txt"),
            dt(2020, 1, 2),
        );

        let mut rules = rules_for(dir.path());
        rules.insert(
            "other".to_string(),
            DetectionRule {
                home_dirs_glob: format!("{}/other/*", dir.path().display()),
                backup_subdir: "Backup".to_string(),
            },
        );

        let result = collect_users(&rules, &[]);
        assert!(matches!(result, Err(Error::DuplicateUser(name)) if name == "alice"));
    }

    #[test]
    fn test_split_classifiable() {
        let dir = TempDir::new().unwrap();
        seed_homes(dir.path());

        let collection = collect_users(&rules_for(dir.path()), &[]).unwrap();
        let (users, warnings) = split_classifiable(collection);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "alice");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("No backup files found (user 'bob')"));
    }
}
