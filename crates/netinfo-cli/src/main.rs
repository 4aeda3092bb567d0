//! netinfo - Main entry point

use clap::Parser;
use netinfo_cli::{commands, Cli, Commands};
use netinfo_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // .env must be loaded before clap reads DATABASE_URL
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.debug {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Console)
        .log_file_prefix("netinfo")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

async fn execute_command(cli: &Cli) -> netinfo_cli::Result<()> {
    let connection_string = cli.connection_string.as_deref();

    match &cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, connection_string, cli.json).await,
        Commands::Lookup { address } => {
            commands::lookup::run(address, connection_string, cli.json).await
        },
        Commands::Search { command } => {
            commands::search::run(command, connection_string, cli.json).await
        },
        Commands::Stats => commands::stats::run(connection_string, cli.json).await,
    }
}
