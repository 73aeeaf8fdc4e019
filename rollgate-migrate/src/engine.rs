//! Orchestration facade.
//!
//! Wires discovery, the history probe, eligibility resolution and the
//! executor together: `prepare` yields the run's plan plus a ready executor,
//! `revert` is the standalone emergency-revert entry point.

use std::path::PathBuf;

use crate::db::MigrationDatabase;
use crate::eligibility::{self, RolloutPlan};
use crate::error::{MigrateResult, MigrationError};
use crate::executor::{AppliedChangeSet, Executor};
use crate::file::{self, ChangeSetFile};
use crate::history::{HistoryStore, HISTORY_TABLE};
use crate::include::IncludePreprocessor;

/// Configuration for the rollout engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory holding the change-set files to consider.
    pub staging_dir: PathBuf,
    /// Root against which `INCLUDE @path` directives resolve.
    pub include_root: PathBuf,
    /// Environment scope for history and eligibility.
    pub environment: String,
    /// Recorded as `executed_by` on every history row.
    pub executed_by: String,
    /// History table name.
    pub history_table: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            staging_dir: PathBuf::from("./database/future"),
            include_root: PathBuf::from("./database"),
            environment: "dev".to_string(),
            executed_by: "system".to_string(),
            history_table: HISTORY_TABLE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the staging directory.
    pub fn staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Set the include root.
    pub fn include_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_root = dir.into();
        self
    }

    /// Set the environment scope.
    pub fn environment(mut self, env: impl Into<String>) -> Self {
        self.environment = env.into();
        self
    }

    /// Set the executing user.
    pub fn executed_by(mut self, user: impl Into<String>) -> Self {
        self.executed_by = user.into();
        self
    }

    /// Set the history table name.
    pub fn history_table(mut self, table: impl Into<String>) -> Self {
        self.history_table = table.into();
        self
    }
}

/// The rollout/rollback orchestration engine.
pub struct MigrationEngine<'a, D: MigrationDatabase + ?Sized> {
    config: EngineConfig,
    db: &'a D,
}

impl<'a, D: MigrationDatabase + ?Sized> MigrationEngine<'a, D> {
    /// Create an engine over an injected database collaborator.
    pub fn new(config: EngineConfig, db: &'a D) -> Self {
        Self { config, db }
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Discover change-sets, probe history once, resolve eligibility, and
    /// return the plan together with an executor sharing that probe result.
    pub async fn prepare(&self) -> MigrateResult<(RolloutPlan, Executor<'a, D>)> {
        let files = file::discover(&self.config.staging_dir).await?;

        let history =
            HistoryStore::detect(self.db, &self.config.history_table, &self.config.environment)
                .await;
        let snapshot = if history.is_available() {
            Some(history.snapshot().await?)
        } else {
            None
        };

        let plan = eligibility::resolve(files, snapshot.as_ref());
        Ok((plan, self.executor(history)))
    }

    /// Standalone revert: run `<identifier>_rollback.sql` directly, bypassing
    /// eligibility. History logging and include expansion still apply.
    pub async fn revert(&self, identifier: &str) -> MigrateResult<AppliedChangeSet> {
        let file_name = format!("{identifier}_rollback.sql");
        let path = self.config.staging_dir.join(&file_name);

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(MigrationError::MissingRollbackFile(file_name));
        }

        let history =
            HistoryStore::detect(self.db, &self.config.history_table, &self.config.environment)
                .await;
        let file = ChangeSetFile::parse(&file_name);
        self.executor(history).run_one(&file).await
    }

    fn executor(&self, history: HistoryStore<'a, D>) -> Executor<'a, D> {
        Executor::new(
            self.db,
            history,
            IncludePreprocessor::new(&self.config.include_root),
            &self.config.staging_dir,
            self.config.executed_by.clone(),
        )
    }
}
