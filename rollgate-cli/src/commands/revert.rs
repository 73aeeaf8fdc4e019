//! `rollgate run-revert` - run a single rollback file directly.

use rollgate_migrate::{EngineConfig, MigrationEngine};
use rollgate_mysql::{ConnectionMode, Database};

use crate::cli::RevertArgs;
use crate::config;
use crate::error::CliResult;
use crate::output;

/// Run the revert command.
pub async fn run(args: RevertArgs) -> CliResult<()> {
    output::info(&format!(
        "Starting rollback for '{}' ({} environment)...",
        args.identifier, args.environment
    ));

    let mut db = Database::connect(ConnectionMode::Standard).await?;
    let outcome = revert(&mut db, &args).await;

    match db.close().await {
        Ok(()) => output::dim("Database connection pool closed."),
        Err(e) => output::warn(&format!("Failed to close connection pool: {}", e)),
    }

    outcome
}

async fn revert(db: &mut Database, args: &RevertArgs) -> CliResult<()> {
    db.set_migration_mode(true).await?;

    let config = EngineConfig::new()
        .staging_dir(&args.staging_dir)
        .include_root(&args.database_dir)
        .environment(args.environment.clone())
        .executed_by(config::executed_by());
    let engine = MigrationEngine::new(config, &*db);

    let applied = engine.revert(&args.identifier).await?;
    output::applied(&applied.file_name, applied.duration_ms);

    output::newline();
    output::success(&format!(
        "Rollback for '{}' completed successfully.",
        args.identifier
    ));
    Ok(())
}
