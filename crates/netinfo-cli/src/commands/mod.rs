//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function. Lookups and
//! searches validate their input before a pool is created.

pub mod ingest;
pub mod lookup;
pub mod search;
pub mod stats;

use crate::error::{CliError, Result};
use netinfo_core::db::{create_pool, DbConfig};
use sqlx::PgPool;
use tracing::debug;

/// Database settings from the environment, with `connection_string` winning
/// over `POSTGRES_*`
pub fn database_config(connection_string: Option<&str>) -> Result<DbConfig> {
    match connection_string {
        Some(url) => Ok(DbConfig::from_env().unwrap_or_default().with_url(url)),
        None => DbConfig::from_env().map_err(|e| CliError::config(e.to_string())),
    }
}

pub(crate) async fn connect(connection_string: Option<&str>) -> Result<PgPool> {
    let config = database_config(connection_string)?;
    debug!(target = %config.target.redacted(), "Connecting to database");
    Ok(create_pool(&config).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netinfo_core::db::DbTarget;

    #[test]
    fn test_explicit_connection_string_wins() {
        let config = database_config(Some("postgresql://u:p@db:5433/blocks")).unwrap();
        match config.target {
            DbTarget::Url(url) => assert_eq!(url, "postgresql://u:p@db:5433/blocks"),
            other => panic!("unexpected target: {other:?}"),
        }
    }
}
