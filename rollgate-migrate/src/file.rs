//! Change-set file discovery and name parsing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MigrateResult;

/// Recognized change-set file extension (compared case-insensitively).
const CHANGESET_EXTENSION: &str = "sql";

/// Suffix marking a reverse change-set.
const ROLLBACK_SUFFIX: &str = "_rollback.sql";

/// Suffix marking a forward change-set.
const ROLLOUT_SUFFIX: &str = "_rollout.sql";

/// Direction of a change-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Forward change that applies a schema/data change.
    Rollout,
    /// Reverse change that undoes a rollout.
    Rollback,
}

impl Direction {
    /// Wire/database representation (`migration_type` column values).
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Rollout => "rollout",
            Direction::Rollback => "rollback",
        }
    }

    /// Parse the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rollout" => Some(Direction::Rollout),
            "rollback" => Some(Direction::Rollback),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change-set file as discovered in the staging directory.
///
/// Derived entirely from the file name; never persisted. The file name is
/// also the sort key: apply order within a batch is its lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSetFile {
    /// File name within the staging directory.
    pub file_name: String,
    /// Identity shared by a rollout/rollback pair; the join key into history.
    pub migration_name: String,
    /// Whether this file rolls forward or back.
    pub direction: Direction,
}

impl ChangeSetFile {
    /// Parse a file name into its migration identity and direction.
    ///
    /// A name ending in `_rollback.sql` (any case) is a rollback; one ending
    /// in `_rollout.sql` is a rollout. Anything else defaults to a rollout
    /// and keeps the whole file name as its migration name.
    pub fn parse(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();

        let (direction, stem_len) = if let Some(stem) = lower.strip_suffix(ROLLBACK_SUFFIX) {
            (Direction::Rollback, stem.len())
        } else if let Some(stem) = lower.strip_suffix(ROLLOUT_SUFFIX) {
            (Direction::Rollout, stem.len())
        } else {
            (Direction::Rollout, file_name.len())
        };

        Self {
            file_name: file_name.to_string(),
            migration_name: file_name[..stem_len].to_string(),
            direction,
        }
    }
}

/// List the change-set files in `directory`, sorted lexicographically.
///
/// Only `.sql` files are considered; the extension check is case-insensitive.
/// Sorting on the file name keeps apply order stable and human-predictable
/// (zero-padded numeric prefixes run first).
pub async fn discover(directory: &Path) -> MigrateResult<Vec<ChangeSetFile>> {
    let mut names = Vec::new();

    let mut entries = tokio::fs::read_dir(directory).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_sql = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(CHANGESET_EXTENSION));
        if !is_sql {
            continue;
        }

        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }

    names.sort();

    Ok(names.iter().map(|n| ChangeSetFile::parse(n)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rollout() {
        let cs = ChangeSetFile::parse("26_add_sharing_rollout.sql");
        assert_eq!(cs.migration_name, "26_add_sharing");
        assert_eq!(cs.direction, Direction::Rollout);
        assert_eq!(cs.file_name, "26_add_sharing_rollout.sql");
    }

    #[test]
    fn test_parse_rollback() {
        let cs = ChangeSetFile::parse("26_add_sharing_rollback.sql");
        assert_eq!(cs.migration_name, "26_add_sharing");
        assert_eq!(cs.direction, Direction::Rollback);
    }

    #[test]
    fn test_parse_suffix_case_insensitive() {
        let cs = ChangeSetFile::parse("7_users_ROLLBACK.SQL");
        assert_eq!(cs.direction, Direction::Rollback);
        assert_eq!(cs.migration_name, "7_users");
    }

    #[test]
    fn test_parse_no_suffix_defaults_to_rollout() {
        // Non-conforming names are not rejected; they run as rollouts under
        // their full file name.
        let cs = ChangeSetFile::parse("bootstrap.sql");
        assert_eq!(cs.direction, Direction::Rollout);
        assert_eq!(cs.migration_name, "bootstrap.sql");
    }

    #[test]
    fn test_direction_round_trip() {
        assert_eq!(Direction::parse("rollout"), Some(Direction::Rollout));
        assert_eq!(Direction::parse("rollback"), Some(Direction::Rollback));
        assert_eq!(Direction::parse("sideways"), None);
    }

    #[tokio::test]
    async fn test_discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10_b_rollout.sql", "02_a_rollout.sql", "notes.txt", "03_c_rollback.SQL"] {
            std::fs::write(dir.path().join(name), "SELECT 1;").unwrap();
        }
        std::fs::create_dir(dir.path().join("archive.sql")).unwrap();

        let files = discover(dir.path()).await.unwrap();
        let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec!["02_a_rollout.sql", "03_c_rollback.SQL", "10_b_rollout.sql"]
        );
        assert_eq!(files[1].direction, Direction::Rollback);
    }

    #[tokio::test]
    async fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let files = discover(dir.path()).await.unwrap();
        assert!(files.is_empty());
    }
}
