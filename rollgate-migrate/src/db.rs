//! Database collaborator contract.
//!
//! The engine talks to the database through [`MigrationDatabase`] so that the
//! orchestration logic can be exercised against an in-memory implementation.
//! The production implementation lives in `rollgate-mysql`.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::error::MigrateResult;

/// A parameter value bound into a prepared statement.
///
/// Kept deliberately small: it covers exactly what the history store and the
/// executor bind. Drivers map these to their native value types at the edge.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Signed integer.
    Int(i64),
    /// Unsigned integer (insert ids, row ids).
    UInt(u64),
    /// Text value.
    Text(String),
    /// UTC timestamp, bound as a `DATETIME`.
    DateTime(DateTime<Utc>),
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<u64> for SqlValue {
    fn from(u: u64) -> Self {
        Self::UInt(u)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::DateTime(ts)
    }
}

/// The query surface the orchestrator requires from the host database.
///
/// Rows come back as JSON objects keyed by column name; `DATETIME` columns
/// surface as ISO-formatted strings. Connection lifecycle (credential mode
/// switching, closing the pool) stays on the concrete database value, owned
/// by whoever constructed it.
#[async_trait::async_trait]
pub trait MigrationDatabase: Send + Sync {
    /// Run a prepared statement with `?` placeholders and return all rows.
    async fn query(&self, sql: &str, params: &[SqlValue]) -> MigrateResult<Vec<JsonValue>>;

    /// Run a script of one or more `;`-separated statements, in order.
    ///
    /// This is the entry point for raw change-set files, which are free to
    /// mix DDL and DML.
    async fn query_multiple(&self, sql: &str) -> MigrateResult<()>;

    /// Insert a row and return the generated id.
    async fn insert(&self, table: &str, data: &[(&str, SqlValue)]) -> MigrateResult<u64>;

    /// Update rows matching `where_clause` and return the affected count.
    async fn update(
        &self,
        table: &str,
        data: &[(&str, SqlValue)],
        where_clause: &str,
        params: &[SqlValue],
    ) -> MigrateResult<u64>;

    /// Delete rows matching `where_clause` and return the affected count.
    async fn delete(
        &self,
        table: &str,
        where_clause: &str,
        params: &[SqlValue],
    ) -> MigrateResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_from_str() {
        assert_eq!(SqlValue::from("dev"), SqlValue::Text("dev".to_string()));
    }

    #[test]
    fn test_sql_value_from_ints() {
        assert_eq!(SqlValue::from(-3i64), SqlValue::Int(-3));
        assert_eq!(SqlValue::from(7u64), SqlValue::UInt(7));
    }
}
