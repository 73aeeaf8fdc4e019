//! `rollgate run-rollout` - apply every eligible change-set.

use rollgate_migrate::{EngineConfig, MigrationEngine};
use rollgate_mysql::{ConnectionMode, Database};

use crate::cli::RolloutArgs;
use crate::config;
use crate::error::CliResult;
use crate::output;

/// Run the rollout command.
pub async fn run(args: RolloutArgs) -> CliResult<()> {
    output::info(&format!(
        "Starting database rollout ({} environment)...",
        args.environment
    ));

    let mut db = Database::connect(ConnectionMode::Standard).await?;
    let outcome = rollout(&mut db, &args).await;

    // The pool is released on every exit path, including failures.
    match db.close().await {
        Ok(()) => output::dim("Database connection pool closed."),
        Err(e) => output::warn(&format!("Failed to close connection pool: {}", e)),
    }

    outcome
}

async fn rollout(db: &mut Database, args: &RolloutArgs) -> CliResult<()> {
    db.set_migration_mode(true).await?;

    let config = EngineConfig::new()
        .staging_dir(&args.staging_dir)
        .include_root(&args.database_dir)
        .environment(args.environment.clone())
        .executed_by(config::executed_by());
    let engine = MigrationEngine::new(config, &*db);

    let (plan, executor) = engine.prepare().await?;

    if plan.bootstrap {
        output::info("History table not found - running all change-sets (first-time setup).");
    }

    for skipped in &plan.skipped {
        output::warn(&format!(
            "Skipping {}: already applied in {}. Roll it back first to re-run.",
            skipped.file_name, args.environment
        ));
    }

    if plan.discovered() == 0 {
        output::success("No change-set files found. Database is up to date.");
        return Ok(());
    }

    if plan.pending.is_empty() {
        output::success(&format!(
            "No new change-sets to run in {}. Database is up to date.",
            args.environment
        ));
        return Ok(());
    }

    output::info(&format!(
        "Found {} change-set(s) to run in {}...",
        plan.pending.len(),
        args.environment
    ));

    for (index, change_set) in plan.pending.iter().enumerate() {
        output::running(&change_set.file_name);

        match executor.run_one(change_set).await {
            Ok(applied) => output::applied(&applied.file_name, applied.duration_ms),
            Err(e) => {
                output::failed(&change_set.file_name);
                for not_run in &plan.pending[index + 1..] {
                    output::not_attempted(&not_run.file_name);
                }
                return Err(e.into());
            }
        }
    }

    output::newline();
    output::success("All change-sets completed successfully.");
    Ok(())
}
