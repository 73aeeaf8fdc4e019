//! Rollgate CLI - apply database rollouts and run targeted reverts.

use clap::Parser;

use rollgate_cli::cli::{Cli, Command};
use rollgate_cli::commands;
use rollgate_cli::error::CliResult;
use rollgate_cli::output;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Usage errors exit 1; --help and --version exit 0.
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    match cli.command {
        Command::RunRollout(args) => commands::rollout::run(args).await,
        Command::RunRevert(args) => commands::revert::run(args).await,
    }
}
