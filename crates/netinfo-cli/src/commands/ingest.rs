//! `netinfo ingest` command implementation
//!
//! Drops and recreates the `block` table (unless `--no-reset`), then loads
//! every dump file found in the dump directory.

use super::connect;
use crate::error::{CliError, Result};
use crate::{render, IngestArgs};
use netinfo_core::config::{Config, IngestConfig};
use netinfo_core::ingest::{ingest_into, rebuild};
use tracing::info;

/// Environment settings with the command-line overrides applied
pub fn ingest_config(args: &IngestArgs) -> IngestConfig {
    let mut config = IngestConfig::from_env();
    if let Some(dir) = &args.dump_dir {
        config.dump_dir = dir.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if args.split_unaligned {
        config.split_unaligned = true;
    }
    if !args.sources.is_empty() {
        config.sources = args.sources.clone();
    }
    config
}

pub async fn run(args: &IngestArgs, connection_string: Option<&str>, json: bool) -> Result<()> {
    let config = Config {
        database: super::database_config(connection_string)?,
        ingest: ingest_config(args),
    };
    config
        .validate()
        .map_err(|e| CliError::config(e.to_string()))?;

    let pool = connect(connection_string).await?;
    info!(
        dump_dir = %config.ingest.dump_dir.display(),
        reset = !args.no_reset,
        sources = ?config.ingest.sources,
        "Starting ingestion"
    );

    let summary = if args.no_reset {
        ingest_into(&pool, &config.ingest).await?
    } else {
        rebuild(&pool, &config.ingest).await?
    };
    pool.close().await;

    if json {
        println!("{}", render::json(&summary)?);
    } else {
        print!("{}", render::summary(&summary));
    }

    let failed = summary.failures().count();
    if failed > 0 {
        return Err(CliError::IncompleteRun { failed });
    }
    Ok(())
}
