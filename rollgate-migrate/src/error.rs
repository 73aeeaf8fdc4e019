//! Error types for the rollout engine.

use thiserror::Error;

/// Result type alias for rollout/rollback operations.
pub type MigrateResult<T> = Result<T, MigrationError>;

/// Errors that can occur while orchestrating change-sets.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// File system error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation error.
    #[error("Database error: {0}")]
    Database(String),

    /// An `INCLUDE` directive referenced a file that could not be read.
    #[error("include file not found: {path}")]
    IncludeNotFound {
        /// Path as written in the directive, relative to the include root.
        path: String,
    },

    /// The standalone revert flow found no rollback file for the identifier.
    #[error("rollback file not found: {0}")]
    MissingRollbackFile(String),

    /// A change-set failed partway through a batch. The source error is the
    /// include or SQL failure; later files in the batch were not attempted.
    #[error("change-set '{file_name}' failed after {elapsed_ms}ms: {source}")]
    ChangeSetFailed {
        /// File name of the change-set that failed.
        file_name: String,
        /// Elapsed time until the failure, in milliseconds.
        elapsed_ms: i64,
        /// The underlying failure.
        #[source]
        source: Box<MigrationError>,
    },
}

impl MigrationError {
    /// Create a database error.
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create an include-not-found error.
    pub fn include_not_found(path: impl Into<String>) -> Self {
        Self::IncludeNotFound { path: path.into() }
    }
}
