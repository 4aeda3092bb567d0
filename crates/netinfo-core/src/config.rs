//! Configuration management
//!
//! Everything is read from the environment (a `.env` file is honored via
//! `dotenvy`); CLI flags override individual values afterwards.

use std::path::PathBuf;
use std::time::Duration;

use crate::db::DbConfig;
use crate::ingest::models::{Source, DUMP_FILES};
use crate::ingest::range::UnalignedRangePolicy;
use crate::ingest::writer::RetryPolicy;

// ============================================================================
// Ingestion Configuration Constants
// ============================================================================

/// Default directory holding the downloaded dumps.
pub const DEFAULT_DUMP_DIR: &str = "./databases";

/// Default number of blocks per committed batch.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Default retries of a failed batch insert.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry, in milliseconds.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Batches buffered per worker between the workers and the writer.
pub const BATCHES_IN_FLIGHT_PER_WORKER: usize = 2;

/// Full configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DbConfig,
    pub ingest: IngestConfig,
}

/// Ingestion run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub dump_dir: PathBuf,
    /// File names looked up in `dump_dir`, in processing order
    pub files: Vec<String>,
    /// Registries to ingest; empty means all of them
    pub sources: Vec<Source>,
    pub workers: usize,
    pub batch_size: usize,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Split unaligned dashed ranges instead of rejecting them
    pub split_unaligned: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            dump_dir: PathBuf::from(DEFAULT_DUMP_DIR),
            files: DUMP_FILES.iter().map(|name| name.to_string()).collect(),
            sources: Vec::new(),
            workers: default_workers(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            split_unaligned: false,
        }
    }
}

/// One worker per available processing unit
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be greater than 0");
        }
        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!("DATABASE_MIN_CONNECTIONS cannot exceed DATABASE_MAX_CONNECTIONS");
        }
        if let crate::db::DbTarget::Url(url) = &self.database.target {
            if url.trim().is_empty() {
                anyhow::bail!("DATABASE_URL cannot be empty");
            }
        }
        self.ingest.validate()
    }
}

impl IngestConfig {
    /// Load ingestion settings from `NETINFO_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let dump_dir = std::env::var("NETINFO_DUMP_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.dump_dir);

        let workers = std::env::var("NETINFO_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.workers);

        let batch_size = std::env::var("NETINFO_BATCH_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.batch_size);

        let max_retries = std::env::var("NETINFO_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_retries);

        let retry_backoff_ms = std::env::var("NETINFO_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.retry_backoff_ms);

        let split_unaligned = std::env::var("NETINFO_SPLIT_UNALIGNED")
            .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.split_unaligned);

        Self {
            dump_dir,
            files: defaults.files,
            sources: defaults.sources,
            workers,
            batch_size,
            max_retries,
            retry_backoff_ms,
            split_unaligned,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workers == 0 {
            anyhow::bail!("NETINFO_WORKERS must be greater than 0");
        }
        if self.batch_size == 0 {
            anyhow::bail!("NETINFO_BATCH_SIZE must be greater than 0");
        }
        if self.files.is_empty() {
            anyhow::bail!("No dump files configured");
        }
        Ok(())
    }

    /// Whether dumps of `source` take part in the run
    pub fn selects(&self, source: Source) -> bool {
        self.sources.is_empty() || self.sources.contains(&source)
    }

    pub fn unaligned_policy(&self) -> UnalignedRangePolicy {
        if self.split_unaligned {
            UnalignedRangePolicy::Split
        } else {
            UnalignedRangePolicy::Reject
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    /// Bound of the worker → writer channel, in batches
    pub fn channel_capacity(&self) -> usize {
        self.workers.max(1) * BATCHES_IN_FLIGHT_PER_WORKER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const INGEST_VARS: &[&str] = &[
        "NETINFO_DUMP_DIR",
        "NETINFO_WORKERS",
        "NETINFO_BATCH_SIZE",
        "NETINFO_MAX_RETRIES",
        "NETINFO_RETRY_BACKOFF_MS",
        "NETINFO_SPLIT_UNALIGNED",
    ];

    fn clear_env() {
        for var in INGEST_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_ingest_config() {
        let config = IngestConfig::default();
        assert_eq!(config.dump_dir, PathBuf::from("./databases"));
        assert_eq!(config.batch_size, 10_000);
        assert_eq!(config.files.len(), DUMP_FILES.len());
        assert!(config.workers >= 1);
        assert_eq!(config.unaligned_policy(), UnalignedRangePolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_ingest_config_from_env() {
        clear_env();
        std::env::set_var("NETINFO_DUMP_DIR", "/srv/dumps");
        std::env::set_var("NETINFO_WORKERS", "3");
        std::env::set_var("NETINFO_BATCH_SIZE", "500");
        std::env::set_var("NETINFO_RETRY_BACKOFF_MS", "20");
        std::env::set_var("NETINFO_SPLIT_UNALIGNED", "true");

        let config = IngestConfig::from_env();
        assert_eq!(config.dump_dir, PathBuf::from("/srv/dumps"));
        assert_eq!(config.workers, 3);
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.retry_policy().backoff, Duration::from_millis(20));
        assert_eq!(config.retry_policy().max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(config.unaligned_policy(), UnalignedRangePolicy::Split);
        assert_eq!(config.channel_capacity(), 6);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_numbers_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("NETINFO_BATCH_SIZE", "lots");

        let config = IngestConfig::from_env();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);

        clear_env();
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = IngestConfig {
            workers: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());

        let config = IngestConfig {
            batch_size: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_selection() {
        let config = IngestConfig::default();
        assert!(Source::ALL.into_iter().all(|source| config.selects(source)));

        let config = IngestConfig {
            sources: vec![Source::Ripe, Source::Lacnic],
            ..IngestConfig::default()
        };
        assert!(config.selects(Source::Ripe));
        assert!(config.selects(Source::Lacnic));
        assert!(!config.selects(Source::Arin));
    }

    #[test]
    fn test_validate_database_pool_bounds() {
        let mut config = Config {
            database: DbConfig::default(),
            ingest: IngestConfig::default(),
        };
        assert!(config.validate().is_ok());

        config.database.min_connections = 50;
        assert!(config.validate().is_err());

        config.database.min_connections = 0;
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        config.database = DbConfig::default().with_url("  ");
        assert!(config.validate().is_err());
    }
}
