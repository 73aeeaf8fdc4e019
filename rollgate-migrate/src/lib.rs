//! # rollgate-migrate
//!
//! Rollout/rollback orchestration engine for versioned SQL change-sets.
//!
//! This crate provides:
//! - Change-set discovery and identity parsing (`<name>_rollout.sql` /
//!   `<name>_rollback.sql`)
//! - `-- INCLUDE @path` expansion for shared SQL fragments
//! - Per-environment execution history with best-effort logging
//! - Pure eligibility resolution (rollouts toggle with rollbacks; rollbacks
//!   are always allowed)
//! - Sequential, halt-on-first-failure execution
//! - A standalone revert flow for emergency rollbacks
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐    ┌──────────────┐    ┌───────────┐
//! │ Discovery │───▶│ Eligibility  │───▶│ Executor  │
//! └───────────┘    └──────────────┘    └───────────┘
//!                        ▲                   │
//!                        │ snapshot          │ start / finish
//!                  ┌─────┴──────┐            ▼
//!                  │  History   │◀───────────┘
//!                  └────────────┘
//! ```
//!
//! The database itself is reached through the [`MigrationDatabase`] trait so
//! the orchestration logic stays testable without a server; the production
//! implementation lives in `rollgate-mysql`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rollgate_migrate::{EngineConfig, MigrationDatabase, MigrationEngine};
//!
//! async fn roll_out(db: &impl MigrationDatabase) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::new()
//!         .staging_dir("./database/future")
//!         .include_root("./database")
//!         .environment("staging");
//!
//!     let engine = MigrationEngine::new(config, db);
//!     let (plan, executor) = engine.prepare().await?;
//!
//!     for change_set in &plan.pending {
//!         let applied = executor.run_one(change_set).await?;
//!         println!("{} in {}ms", applied.file_name, applied.duration_ms);
//!     }
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod eligibility;
pub mod engine;
pub mod error;
pub mod executor;
pub mod file;
pub mod history;
pub mod include;

#[cfg(test)]
pub(crate) mod testkit;

// Re-exports
pub use db::{MigrationDatabase, SqlValue};
pub use eligibility::{resolve, RolloutPlan};
pub use engine::{EngineConfig, MigrationEngine};
pub use error::{MigrateResult, MigrationError};
pub use executor::{AppliedChangeSet, BatchOutcome, Executor};
pub use file::{discover, ChangeSetFile, Direction};
pub use history::{
    ExecutionRecord, ExecutionResult, HistorySnapshot, HistoryStore, SuccessRecord, HISTORY_TABLE,
};
pub use include::IncludePreprocessor;
