//! Error types for MySQL operations.

use thiserror::Error;

/// Result type for MySQL operations.
pub type MysqlResult<T> = Result<T, MysqlError>;

/// Error type for MySQL operations.
#[derive(Debug, Error)]
pub enum MysqlError {
    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    Mysql(#[from] mysql_async::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required credential variable is not set. Fatal at startup; the
    /// process must not fall back to another credential set.
    #[error("missing database credentials: {0} is not set")]
    MissingCredentials(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),
}

impl MysqlError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing-credentials error for an environment variable.
    pub fn missing_credentials(var: impl Into<String>) -> Self {
        Self::MissingCredentials(var.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}

impl From<MysqlError> for rollgate_migrate::MigrationError {
    fn from(err: MysqlError) -> Self {
        rollgate_migrate::MigrationError::Database(err.to_string())
    }
}
