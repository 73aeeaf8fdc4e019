//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{DATABASE_DIR, DEFAULT_ENVIRONMENT, STAGING_DIR};

/// Rollgate - database rollout/rollback orchestration
#[derive(Parser, Debug)]
#[command(name = "rollgate")]
#[command(version)]
#[command(about = "Rollgate - database rollout/rollback orchestration", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply every eligible change-set for the current environment
    RunRollout(RolloutArgs),

    /// Run one rollback file directly, bypassing eligibility checks
    RunRevert(RevertArgs),
}

/// Arguments for the `run-rollout` command
#[derive(Args, Debug)]
pub struct RolloutArgs {
    /// Environment scoping eligibility and history
    #[arg(short, long, env = "ENVIRONMENT", default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// Directory holding pending change-set files
    #[arg(long, default_value = STAGING_DIR)]
    pub staging_dir: PathBuf,

    /// Root directory for INCLUDE directives
    #[arg(long, default_value = DATABASE_DIR)]
    pub database_dir: PathBuf,
}

/// Arguments for the `run-revert` command
#[derive(Args, Debug)]
pub struct RevertArgs {
    /// Identifier of the rollback to run (matches `<identifier>_rollback.sql`)
    pub identifier: String,

    /// Environment scoping history
    #[arg(short, long, env = "ENVIRONMENT", default_value = DEFAULT_ENVIRONMENT)]
    pub environment: String,

    /// Directory holding pending change-set files
    #[arg(long, default_value = STAGING_DIR)]
    pub staging_dir: PathBuf,

    /// Root directory for INCLUDE directives
    #[arg(long, default_value = DATABASE_DIR)]
    pub database_dir: PathBuf,
}
