//! CLI error types and result alias.

use miette::Diagnostic;
use thiserror::Error;

use rollgate_migrate::MigrationError;
use rollgate_mysql::MysqlError;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(rollgate::io))]
    Io(#[from] std::io::Error),

    /// Database/connection error
    #[error("Database error: {0}")]
    #[diagnostic(code(rollgate::database))]
    Database(#[from] MysqlError),

    /// Migration error
    #[error("{0}")]
    #[diagnostic(code(rollgate::migration))]
    Migration(#[from] MigrationError),
}
