//! The database collaborator.
//!
//! [`Database`] is an explicit value injected into whatever needs it, not a
//! process-wide singleton. It carries its [`ConnectionMode`] openly:
//! ordinary operation runs under standard credentials, the migration
//! orchestrator switches to the elevated set for the duration of a run, and
//! the two are never active at once in a single instance.

use mysql_async::prelude::*;
use mysql_async::{Params, Row, Value};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use rollgate_migrate::{MigrateResult, MigrationDatabase, SqlValue};

use crate::config::{ConnectionMode, MysqlConfig};
use crate::error::MysqlResult;
use crate::pool::MysqlPool;

/// A pooled MySQL database under one credential mode.
pub struct Database {
    pool: MysqlPool,
    mode: ConnectionMode,
}

impl Database {
    /// Connect under `mode`, reading configuration from the environment.
    /// Missing credentials fail here, before any work is attempted.
    pub async fn connect(mode: ConnectionMode) -> MysqlResult<Self> {
        let config = MysqlConfig::from_env(mode)?;
        Ok(Self::with_config(&config, mode))
    }

    /// Build a database over an explicit configuration.
    pub fn with_config(config: &MysqlConfig, mode: ConnectionMode) -> Self {
        Self {
            pool: MysqlPool::new(config),
            mode,
        }
    }

    /// The credential mode currently backing the pool.
    pub fn mode(&self) -> ConnectionMode {
        self.mode
    }

    /// Switch between standard and elevated credentials.
    ///
    /// Validates the target credential set first, then creates the new pool
    /// and tears down the old one. A no-op when the mode is already active.
    pub async fn set_migration_mode(&mut self, enabled: bool) -> MysqlResult<()> {
        let target = if enabled {
            ConnectionMode::Migration
        } else {
            ConnectionMode::Standard
        };
        if target == self.mode {
            return Ok(());
        }

        let config = MysqlConfig::from_env(target)?;
        let old = std::mem::replace(&mut self.pool, MysqlPool::new(&config));
        old.disconnect().await?;
        self.mode = target;

        info!(mode = %target, "connection mode switched");
        Ok(())
    }

    /// Check connectivity.
    pub async fn is_healthy(&self) -> bool {
        self.pool.is_healthy().await
    }

    /// Close the connection pool. Call on every exit path.
    pub async fn close(self) -> MysqlResult<()> {
        self.pool.disconnect().await
    }

    /// Run a prepared statement with `?` placeholders; rows come back as
    /// JSON objects keyed by column name.
    pub async fn query(&self, sql: &str, params: &[SqlValue]) -> MysqlResult<Vec<JsonValue>> {
        debug!(query = %sql, "executing query");
        let mut conn = self.pool.get().await?;
        let rows: Vec<Row> = conn.exec(sql, to_params(params)).await?;
        Ok(rows.into_iter().map(row_to_json).collect())
    }

    /// Run a script of `;`-separated statements, in order, on one
    /// connection. The driver rejects multi-statement text, so the script is
    /// split and each statement executed individually.
    pub async fn query_multiple(&self, sql: &str) -> MysqlResult<()> {
        debug!("executing SQL script");
        let mut conn = self.pool.get().await?;
        for statement in split_statements(sql) {
            conn.query_drop(statement).await?;
        }
        Ok(())
    }

    /// Insert a row and return the generated id.
    pub async fn insert(&self, table: &str, data: &[(&str, SqlValue)]) -> MysqlResult<u64> {
        let columns: Vec<&str> = data.iter().map(|(c, _)| *c).collect();
        let sql = build_insert(table, &columns);
        let values: Vec<SqlValue> = data.iter().map(|(_, v)| v.clone()).collect();

        debug!(query = %sql, "executing insert");
        let mut conn = self.pool.get().await?;
        conn.exec_drop(&sql, to_params(&values)).await?;
        Ok(conn.last_insert_id().unwrap_or(0))
    }

    /// Update rows matching `where_clause`; returns the affected count.
    pub async fn update(
        &self,
        table: &str,
        data: &[(&str, SqlValue)],
        where_clause: &str,
        params: &[SqlValue],
    ) -> MysqlResult<u64> {
        let columns: Vec<&str> = data.iter().map(|(c, _)| *c).collect();
        let sql = build_update(table, &columns, where_clause);
        let mut values: Vec<SqlValue> = data.iter().map(|(_, v)| v.clone()).collect();
        values.extend_from_slice(params);

        debug!(query = %sql, "executing update");
        let mut conn = self.pool.get().await?;
        conn.exec_drop(&sql, to_params(&values)).await?;
        Ok(conn.affected_rows())
    }

    /// Delete rows matching `where_clause`; returns the affected count.
    pub async fn delete(
        &self,
        table: &str,
        where_clause: &str,
        params: &[SqlValue],
    ) -> MysqlResult<u64> {
        let sql = build_delete(table, where_clause);

        debug!(query = %sql, "executing delete");
        let mut conn = self.pool.get().await?;
        conn.exec_drop(&sql, to_params(params)).await?;
        Ok(conn.affected_rows())
    }
}

#[async_trait::async_trait]
impl MigrationDatabase for Database {
    async fn query(&self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<JsonValue>> {
        Ok(Database::query(self, sql, params).await?)
    }

    async fn query_multiple(&self, sql: &str) -> MigrateResult<()> {
        Ok(Database::query_multiple(self, sql).await?)
    }

    async fn insert(&self, table: &str, data: &[(&str, SqlValue)]) -> MigrateResult<u64> {
        Ok(Database::insert(self, table, data).await?)
    }

    async fn update(
        &self,
        table: &str,
        data: &[(&str, SqlValue)],
        where_clause: &str,
        params: &[SqlValue],
    ) -> MigrateResult<u64> {
        Ok(Database::update(self, table, data, where_clause, params).await?)
    }

    async fn delete(
        &self,
        table: &str,
        where_clause: &str,
        params: &[SqlValue],
    ) -> MigrateResult<u64> {
        Ok(Database::delete(self, table, where_clause, params).await?)
    }
}

/// Split a script into non-empty statements.
fn split_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn build_insert(table: &str, columns: &[&str]) -> String {
    let cols = columns
        .iter()
        .map(|c| format!("`{}`", c))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!("INSERT INTO `{}` ({}) VALUES ({})", table, cols, placeholders)
}

fn build_update(table: &str, columns: &[&str], where_clause: &str) -> String {
    let assignments = columns
        .iter()
        .map(|c| format!("`{}` = ?", c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE `{}` SET {} WHERE {}", table, assignments, where_clause)
}

fn build_delete(table: &str, where_clause: &str) -> String {
    format!("DELETE FROM `{}` WHERE {}", table, where_clause)
}

/// Map an engine parameter value to a driver value. Timestamps are bound as
/// their `DATETIME` literal form.
fn to_mysql_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Int(i) => Value::from(*i),
        SqlValue::UInt(u) => Value::from(*u),
        SqlValue::Text(s) => Value::from(s.as_str()),
        SqlValue::DateTime(ts) => {
            Value::from(ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string())
        }
    }
}

fn to_params(values: &[SqlValue]) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values.iter().map(to_mysql_value).collect())
    }
}

/// Convert a driver row to a JSON object keyed by column name. `DATETIME`
/// columns surface as ISO-formatted strings.
fn row_to_json(row: Row) -> JsonValue {
    let mut map = Map::new();

    for (i, column) in row.columns_ref().iter().enumerate() {
        let name = column.name_str().to_string();
        let value: Option<Value> = row.get(i);

        let json_value = match value {
            Some(Value::NULL) | None => JsonValue::Null,
            Some(Value::Bytes(bytes)) => match String::from_utf8(bytes) {
                Ok(s) => JsonValue::String(s),
                Err(e) => JsonValue::String(format!("<binary {} bytes>", e.into_bytes().len())),
            },
            Some(Value::Int(i)) => JsonValue::Number(i.into()),
            Some(Value::UInt(u)) => JsonValue::Number(u.into()),
            Some(Value::Float(f)) => serde_json::Number::from_f64(f64::from(f))
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Some(Value::Double(d)) => serde_json::Number::from_f64(d)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Some(Value::Date(year, month, day, hour, minute, second, micro)) => {
                JsonValue::String(format!(
                    "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06}",
                    year, month, day, hour, minute, second, micro
                ))
            }
            Some(Value::Time(is_neg, days, hours, minutes, seconds, micro)) => {
                let sign = if is_neg { "-" } else { "" };
                JsonValue::String(format!(
                    "{}{}:{:02}:{:02}.{:06}",
                    sign,
                    days * 24 + u32::from(hours),
                    minutes,
                    seconds,
                    micro
                ))
            }
        };

        map.insert(name, json_value);
    }

    JsonValue::Object(map)
}
