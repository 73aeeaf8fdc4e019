//! In-memory database fake for engine tests.

use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value as JsonValue};

use crate::db::{MigrationDatabase, SqlValue};
use crate::error::{MigrateResult, MigrationError};

/// A scripted, in-memory stand-in for the MySQL collaborator.
///
/// It understands the two query shapes the history store issues (the
/// capability probe and the success snapshot) and records everything the
/// executor writes, so tests can assert on the exact history left behind.
#[derive(Default)]
pub struct MemoryDb {
    history_table: bool,
    success_rows: Vec<JsonValue>,
    fail_inserts: bool,
    fail_script_containing: Option<String>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    rows: Vec<LogRow>,
    scripts: Vec<String>,
    next_id: u64,
}

/// A history row as written through `insert` / `update`.
#[derive(Debug, Clone)]
pub struct LogRow {
    pub id: u64,
    pub migration_name: String,
    pub file_name: String,
    pub migration_type: String,
    pub environment: String,
    pub result: String,
    pub executed_by: String,
    pub execution_time_ms: Option<i64>,
    pub error_message: Option<String>,
}

impl MemoryDb {
    /// A database where the history table exists.
    pub fn with_history() -> Self {
        Self {
            history_table: true,
            ..Self::default()
        }
    }

    /// Seed the rows returned by the snapshot query.
    pub fn seed_success(mut self, rows: Vec<JsonValue>) -> Self {
        self.success_rows = rows;
        self
    }

    /// Make every `insert` fail (broken audit table).
    pub fn failing_inserts(mut self) -> Self {
        self.fail_inserts = true;
        self
    }

    /// Make `query_multiple` fail for any script containing `needle`.
    pub fn fail_script_containing(mut self, needle: &str) -> Self {
        self.fail_script_containing = Some(needle.to_string());
        self
    }

    /// History rows written so far.
    pub fn rows(&self) -> Vec<LogRow> {
        self.state.lock().unwrap().rows.clone()
    }

    /// Scripts executed through `query_multiple`, in order.
    pub fn scripts(&self) -> Vec<String> {
        self.state.lock().unwrap().scripts.clone()
    }
}

fn text(value: &SqlValue) -> String {
    match value {
        SqlValue::Text(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

#[async_trait::async_trait]
impl MigrationDatabase for MemoryDb {
    async fn query(&self, sql: &str, _params: &[SqlValue]) -> MigrateResult<Vec<JsonValue>> {
        if sql.starts_with("SELECT 1 FROM") {
            return if self.history_table {
                Ok(vec![])
            } else {
                Err(MigrationError::database("table 'migration_log' doesn't exist"))
            };
        }
        if sql.contains("migration_name, migration_type, executed_at") {
            return Ok(self.success_rows.clone());
        }
        Ok(vec![])
    }

    async fn query_multiple(&self, sql: &str) -> MigrateResult<()> {
        if let Some(needle) = &self.fail_script_containing {
            if sql.contains(needle.as_str()) {
                return Err(MigrationError::database(format!(
                    "scripted failure on '{needle}'"
                )));
            }
        }
        self.state.lock().unwrap().scripts.push(sql.to_string());
        Ok(())
    }

    async fn insert(&self, _table: &str, data: &[(&str, SqlValue)]) -> MigrateResult<u64> {
        if self.fail_inserts {
            return Err(MigrationError::database("insert refused"));
        }

        let field = |name: &str| {
            data.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| text(v))
                .unwrap_or_default()
        };

        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.rows.push(LogRow {
            id,
            migration_name: field("migration_name"),
            file_name: field("file_name"),
            migration_type: field("migration_type"),
            environment: field("environment"),
            result: field("result"),
            executed_by: field("executed_by"),
            execution_time_ms: None,
            error_message: None,
        });
        Ok(id)
    }

    async fn update(
        &self,
        _table: &str,
        data: &[(&str, SqlValue)],
        _where_clause: &str,
        params: &[SqlValue],
    ) -> MigrateResult<u64> {
        let Some(SqlValue::UInt(id)) = params.first() else {
            return Ok(0);
        };

        let mut state = self.state.lock().unwrap();
        let Some(row) = state.rows.iter_mut().find(|r| r.id == *id) else {
            return Ok(0);
        };

        for (column, value) in data {
            match *column {
                "result" => row.result = text(value),
                "execution_time_ms" => {
                    if let SqlValue::Int(ms) = value {
                        row.execution_time_ms = Some(*ms);
                    }
                }
                "error_message" => row.error_message = Some(text(value)),
                _ => {}
            }
        }
        Ok(1)
    }

    async fn delete(
        &self,
        _table: &str,
        _where_clause: &str,
        params: &[SqlValue],
    ) -> MigrateResult<u64> {
        let Some(SqlValue::UInt(id)) = params.first() else {
            return Ok(0);
        };
        let mut state = self.state.lock().unwrap();
        let before = state.rows.len();
        state.rows.retain(|r| r.id != *id);
        Ok((before - state.rows.len()) as u64)
    }
}

/// A snapshot row as the driver would return it.
pub fn success_row(name: &str, migration_type: &str, executed_at: &str) -> JsonValue {
    json!({
        "migration_name": name,
        "migration_type": migration_type,
        "executed_at": executed_at,
    })
}

/// Deterministic timestamp fixture: `minutes` past a fixed origin.
pub fn ts(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}
