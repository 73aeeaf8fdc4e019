//! Execution history tracking.
//!
//! Every run attempt is logged to a history table, partitioned by
//! environment. The table may legitimately not exist yet (a fresh database
//! bootstraps itself through the very change-sets this engine applies), so
//! the store probes for it once per run and degrades every logging call to a
//! best-effort no-op when it is absent. A logging failure never blocks the
//! underlying change-set.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::db::{MigrationDatabase, SqlValue};
use crate::error::MigrateResult;
use crate::file::{ChangeSetFile, Direction};

/// Default history table name.
pub const HISTORY_TABLE: &str = "migration_log";

/// Reference schema for the history table (MySQL).
pub const MYSQL_INIT_SQL: &str = r"
CREATE TABLE IF NOT EXISTS `migration_log` (
    `id` BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    `migration_name` VARCHAR(255) NOT NULL,
    `file_name` VARCHAR(255) NOT NULL,
    `migration_type` ENUM('rollout', 'rollback') NOT NULL,
    `environment` VARCHAR(64) NOT NULL,
    `result` ENUM('in_progress', 'success', 'failed') NOT NULL,
    `executed_by` VARCHAR(255) NOT NULL,
    `executed_at` DATETIME(6) NOT NULL,
    `execution_time_ms` BIGINT NULL,
    `error_message` TEXT NULL,
    KEY `migration_log_lookup_idx` (`migration_name`, `environment`, `executed_at`)
);
";

/// Outcome column values for an execution record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Recorded before the change-set runs.
    InProgress,
    /// The change-set committed.
    Success,
    /// The change-set failed; `error_message` carries the cause.
    Failed,
}

impl ExecutionResult {
    /// Database representation (`result` column values).
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionResult::InProgress => "in_progress",
            ExecutionResult::Success => "success",
            ExecutionResult::Failed => "failed",
        }
    }
}

/// The fields the orchestrator supplies when opening an execution record.
///
/// `result`, `execution_time_ms` and `error_message` are finalized later via
/// [`HistoryStore::finish`]; a record is finalized at most once.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    /// Migration identity (file name minus the direction suffix).
    pub migration_name: String,
    /// Exact file name that was run.
    pub file_name: String,
    /// Rollout or rollback.
    pub direction: Direction,
    /// Environment scope this attempt belongs to.
    pub environment: String,
    /// Operating-system user (or `system`) driving the run.
    pub executed_by: String,
    /// When the attempt started (UTC).
    pub executed_at: DateTime<Utc>,
}

impl ExecutionRecord {
    /// Open a record for a change-set attempt starting now.
    pub fn begin(file: &ChangeSetFile, environment: &str, executed_by: &str) -> Self {
        Self {
            migration_name: file.migration_name.clone(),
            file_name: file.file_name.clone(),
            direction: file.direction,
            environment: environment.to_string(),
            executed_by: executed_by.to_string(),
            executed_at: Utc::now(),
        }
    }
}

/// A per-environment view of every successful execution, fetched once per
/// run. This is the pure input the eligibility resolver works from.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    records: Vec<SuccessRecord>,
}

/// One successful execution in the snapshot.
#[derive(Debug, Clone)]
pub struct SuccessRecord {
    /// Migration identity.
    pub migration_name: String,
    /// Direction that succeeded.
    pub direction: Direction,
    /// When it succeeded.
    pub executed_at: DateTime<Utc>,
}

impl HistorySnapshot {
    /// Build a snapshot from success records (any order).
    pub fn new(mut records: Vec<SuccessRecord>) -> Self {
        records.sort_by_key(|r| r.executed_at);
        Self { records }
    }

    /// Timestamp of the most recent success for `(name, direction)`, if any.
    pub fn latest_success(&self, name: &str, direction: Direction) -> Option<DateTime<Utc>> {
        self.records
            .iter()
            .rev()
            .find(|r| r.migration_name == name && r.direction == direction)
            .map(|r| r.executed_at)
    }

    /// Whether a rollback for `name` succeeded strictly after `after`.
    pub fn rollback_since(&self, name: &str, after: DateTime<Utc>) -> bool {
        self.records.iter().any(|r| {
            r.migration_name == name
                && r.direction == Direction::Rollback
                && r.executed_at > after
        })
    }
}

/// Append-only log of execution attempts, scoped to one environment.
pub struct HistoryStore<'a, D: MigrationDatabase + ?Sized> {
    db: &'a D,
    table: String,
    environment: String,
    available: bool,
}

impl<'a, D: MigrationDatabase + ?Sized> HistoryStore<'a, D> {
    /// Probe for the history table and construct the store.
    ///
    /// The probe runs exactly once per orchestration run; a missing table (or
    /// any probe failure) marks the store unavailable, which is a valid state
    /// ("bootstrap mode"), not an error.
    pub async fn detect(db: &'a D, table: &str, environment: &str) -> HistoryStore<'a, D> {
        let probe = format!("SELECT 1 FROM `{}` LIMIT 1", table);
        let available = db.query(&probe, &[]).await.is_ok();

        if !available {
            warn!(table = %table, "history table not found; logging disabled for this run");
        }

        Self {
            db,
            table: table.to_string(),
            environment: environment.to_string(),
            available,
        }
    }

    /// Whether the history table answered the probe.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Environment this store is scoped to.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Fetch all successful executions for this environment, oldest first.
    pub async fn snapshot(&self) -> MigrateResult<HistorySnapshot> {
        if !self.available {
            return Ok(HistorySnapshot::default());
        }

        let sql = format!(
            "SELECT migration_name, migration_type, executed_at FROM `{}` \
             WHERE environment = ? AND result = ? ORDER BY executed_at ASC",
            self.table
        );
        let params = [
            SqlValue::from(self.environment.as_str()),
            SqlValue::from(ExecutionResult::Success.as_str()),
        ];
        let rows = self.db.query(&sql, &params).await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match parse_success_row(row) {
                Some(record) => records.push(record),
                None => warn!(row = %row, "skipping malformed history row"),
            }
        }

        Ok(HistorySnapshot::new(records))
    }

    /// Record the start of an attempt as `in_progress`. Best-effort: returns
    /// `None` when the store is unavailable or the insert fails.
    pub async fn start(&self, record: &ExecutionRecord) -> Option<u64> {
        if !self.available {
            return None;
        }

        let data = [
            ("migration_name", SqlValue::from(record.migration_name.as_str())),
            ("file_name", SqlValue::from(record.file_name.as_str())),
            ("migration_type", SqlValue::from(record.direction.as_str())),
            ("environment", SqlValue::from(record.environment.as_str())),
            ("result", SqlValue::from(ExecutionResult::InProgress.as_str())),
            ("executed_by", SqlValue::from(record.executed_by.as_str())),
            ("executed_at", SqlValue::from(record.executed_at)),
        ];

        match self.db.insert(&self.table, &data).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(file = %record.file_name, error = %e, "could not write history record");
                None
            }
        }
    }

    /// Finalize a record opened by [`start`](Self::start). A no-op when the
    /// record id is `None`; a failed update is logged and swallowed (the
    /// change-set's own outcome stands regardless).
    pub async fn finish(
        &self,
        record_id: Option<u64>,
        result: ExecutionResult,
        execution_time_ms: i64,
        error_message: Option<&str>,
    ) {
        let Some(id) = record_id else {
            return;
        };

        let mut data = vec![
            ("result", SqlValue::from(result.as_str())),
            ("execution_time_ms", SqlValue::Int(execution_time_ms)),
        ];
        if let Some(message) = error_message {
            data.push(("error_message", SqlValue::from(message)));
        }

        if let Err(e) = self.db.update(&self.table, &data, "id = ?", &[SqlValue::UInt(id)]).await {
            warn!(record_id = id, error = %e, "could not finalize history record");
        }
    }
}

/// Parse one snapshot row. `executed_at` arrives as the driver's ISO-ish
/// string form; both `T` and space separators are accepted.
fn parse_success_row(row: &JsonValue) -> Option<SuccessRecord> {
    let migration_name = row.get("migration_name")?.as_str()?.to_string();
    let direction = Direction::parse(row.get("migration_type")?.as_str()?)?;
    let executed_at = parse_datetime(row.get("executed_at")?.as_str()?)?;

    Some(SuccessRecord {
        migration_name,
        direction,
        executed_at,
    })
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{success_row, ts, MemoryDb};

    #[test]
    fn test_init_sql_columns() {
        for column in [
            "migration_name",
            "file_name",
            "migration_type",
            "environment",
            "result",
            "executed_by",
            "executed_at",
            "execution_time_ms",
            "error_message",
        ] {
            assert!(MYSQL_INIT_SQL.contains(column), "missing column {column}");
        }
    }

    #[test]
    fn test_parse_datetime_both_separators() {
        assert!(parse_datetime("2025-03-01T09:30:00.000000").is_some());
        assert!(parse_datetime("2025-03-01 09:30:00").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn test_snapshot_latest_success_picks_newest() {
        let snap = HistorySnapshot::new(vec![
            SuccessRecord {
                migration_name: "26_share".into(),
                direction: Direction::Rollout,
                executed_at: ts(10),
            },
            SuccessRecord {
                migration_name: "26_share".into(),
                direction: Direction::Rollout,
                executed_at: ts(30),
            },
            SuccessRecord {
                migration_name: "26_share".into(),
                direction: Direction::Rollback,
                executed_at: ts(20),
            },
        ]);

        assert_eq!(snap.latest_success("26_share", Direction::Rollout), Some(ts(30)));
        assert_eq!(snap.latest_success("26_share", Direction::Rollback), Some(ts(20)));
        assert_eq!(snap.latest_success("27_other", Direction::Rollout), None);
    }

    #[test]
    fn test_snapshot_rollback_since_is_strict() {
        let snap = HistorySnapshot::new(vec![SuccessRecord {
            migration_name: "m".into(),
            direction: Direction::Rollback,
            executed_at: ts(20),
        }]);

        assert!(snap.rollback_since("m", ts(10)));
        assert!(!snap.rollback_since("m", ts(20)));
        assert!(!snap.rollback_since("m", ts(30)));
        assert!(!snap.rollback_since("other", ts(10)));
    }

    #[tokio::test]
    async fn test_detect_without_table() {
        let db = MemoryDb::default();
        let store = HistoryStore::detect(&db, HISTORY_TABLE, "dev").await;
        assert!(!store.is_available());

        // All logging degrades to no-ops.
        let record = ExecutionRecord::begin(
            &ChangeSetFile::parse("1_a_rollout.sql"),
            "dev",
            "tester",
        );
        assert_eq!(store.start(&record).await, None);
        store.finish(None, ExecutionResult::Success, 5, None).await;
        assert!(db.rows().is_empty());
    }

    #[tokio::test]
    async fn test_start_and_finish_round_trip() {
        let db = MemoryDb::with_history();
        let store = HistoryStore::detect(&db, HISTORY_TABLE, "staging").await;
        assert!(store.is_available());

        let record = ExecutionRecord::begin(
            &ChangeSetFile::parse("7_users_rollout.sql"),
            "staging",
            "tester",
        );
        let id = store.start(&record).await.expect("insert id");
        store
            .finish(Some(id), ExecutionResult::Failed, 42, Some("bad SQL"))
            .await;

        let rows = db.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].migration_name, "7_users");
        assert_eq!(rows[0].file_name, "7_users_rollout.sql");
        assert_eq!(rows[0].migration_type, "rollout");
        assert_eq!(rows[0].environment, "staging");
        assert_eq!(rows[0].result, "failed");
        assert_eq!(rows[0].execution_time_ms, Some(42));
        assert_eq!(rows[0].error_message.as_deref(), Some("bad SQL"));
    }

    #[tokio::test]
    async fn test_snapshot_parses_rows() {
        let db = MemoryDb::with_history().seed_success(vec![
            success_row("26_share", "rollout", "2025-03-01T10:00:00.000000"),
            success_row("26_share", "rollback", "2025-03-02 11:00:00"),
        ]);
        let store = HistoryStore::detect(&db, HISTORY_TABLE, "dev").await;

        let snap = store.snapshot().await.unwrap();
        let rollout = snap.latest_success("26_share", Direction::Rollout).unwrap();
        assert!(snap.rollback_since("26_share", rollout));
    }
}
