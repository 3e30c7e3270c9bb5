//! wsmig CLI - Command-line interface for workspace migration.

use clap::Parser;

use wsmig_cli::cli::{Cli, Command};
use wsmig_cli::commands;
use wsmig_cli::error::CliResult;
use wsmig_cli::logging;
use wsmig_cli::output;

#[tokio::main]
async fn main() {
    logging::init();

    // Run the CLI and handle errors
    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Command::Migrate(args) => commands::migrate::run(&config, args).await,
        Command::Validate => commands::validate::run(&config).await,
        Command::Export(args) => commands::export::run(&config, args).await,
        Command::Kinds => commands::kinds::run().await,
        Command::Version => commands::version::run().await,
    }
}
