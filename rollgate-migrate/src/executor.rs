//! Change-set execution.
//!
//! Runs eligible change-sets one at a time, in order, on the migration-mode
//! connection. Each file commits independently: a failure is recorded, then
//! re-raised to halt the batch, leaving earlier files applied. There is no
//! compensating rollback; partial application is visible in the history, not
//! hidden.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info};

use crate::db::MigrationDatabase;
use crate::error::{MigrateResult, MigrationError};
use crate::file::ChangeSetFile;
use crate::history::{ExecutionRecord, ExecutionResult, HistoryStore};
use crate::include::IncludePreprocessor;

/// A successfully applied change-set.
#[derive(Debug, Clone)]
pub struct AppliedChangeSet {
    /// File that was applied.
    pub file_name: String,
    /// Wall-clock execution time in milliseconds.
    pub duration_ms: i64,
}

/// Result of a completed batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Change-sets applied, in order.
    pub applied: Vec<AppliedChangeSet>,
    /// Total batch duration in milliseconds.
    pub duration_ms: i64,
}

/// Executes change-sets against one database, logging to one history store.
pub struct Executor<'a, D: MigrationDatabase + ?Sized> {
    db: &'a D,
    history: HistoryStore<'a, D>,
    include: IncludePreprocessor,
    staging_dir: PathBuf,
    executed_by: String,
}

impl<'a, D: MigrationDatabase + ?Sized> Executor<'a, D> {
    /// Create an executor.
    pub fn new(
        db: &'a D,
        history: HistoryStore<'a, D>,
        include: IncludePreprocessor,
        staging_dir: impl Into<PathBuf>,
        executed_by: impl Into<String>,
    ) -> Self {
        Self {
            db,
            history,
            include,
            staging_dir: staging_dir.into(),
            executed_by: executed_by.into(),
        }
    }

    /// Run one change-set: open an `in_progress` record, read and expand the
    /// file, execute it, then finalize the record with the outcome.
    ///
    /// On failure the error is wrapped as [`MigrationError::ChangeSetFailed`]
    /// so callers can report the file and elapsed time; the underlying cause
    /// lands in the history row's `error_message`.
    pub async fn run_one(&self, file: &ChangeSetFile) -> MigrateResult<AppliedChangeSet> {
        info!(file = %file.file_name, direction = %file.direction, "running change-set");

        let record = ExecutionRecord::begin(file, self.history.environment(), &self.executed_by);
        let record_id = self.history.start(&record).await;
        let started = Instant::now();

        match self.execute_file(file).await {
            Ok(()) => {
                let elapsed_ms = started.elapsed().as_millis() as i64;
                self.history
                    .finish(record_id, ExecutionResult::Success, elapsed_ms, None)
                    .await;
                debug!(file = %file.file_name, elapsed_ms, "change-set applied");
                Ok(AppliedChangeSet {
                    file_name: file.file_name.clone(),
                    duration_ms: elapsed_ms,
                })
            }
            Err(source) => {
                let elapsed_ms = started.elapsed().as_millis() as i64;
                self.history
                    .finish(
                        record_id,
                        ExecutionResult::Failed,
                        elapsed_ms,
                        Some(&source.to_string()),
                    )
                    .await;
                Err(MigrationError::ChangeSetFailed {
                    file_name: file.file_name.clone(),
                    elapsed_ms,
                    source: Box::new(source),
                })
            }
        }
    }

    /// Run a batch sequentially, halting on the first failure. Files after
    /// the failed one are not attempted and leave no history record.
    pub async fn run_batch(&self, pending: &[ChangeSetFile]) -> MigrateResult<BatchOutcome> {
        let started = Instant::now();
        let mut applied = Vec::with_capacity(pending.len());

        for file in pending {
            applied.push(self.run_one(file).await?);
        }

        Ok(BatchOutcome {
            applied,
            duration_ms: started.elapsed().as_millis() as i64,
        })
    }

    async fn execute_file(&self, file: &ChangeSetFile) -> MigrateResult<()> {
        let raw = tokio::fs::read_to_string(self.staging_dir.join(&file.file_name)).await?;
        let sql = self.include.expand(&raw).await?;
        self.db.query_multiple(&sql).await
    }
}
