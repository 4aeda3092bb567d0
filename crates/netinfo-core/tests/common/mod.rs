//! Common test utilities for netinfo-core integration tests
//!
//! - [`MemorySink`]: in-memory [`BlockSink`] for pipeline tests without a database
//! - [`write_gz`] / [`write_plain`]: dump fixtures in a temp directory
//! - [`TestPostgres`]: PostgreSQL container with the `block` schema applied
//!
//! Container tests need Docker and are marked `#[ignore = "requires Docker"]`:
//!
//! ```bash
//! cargo test -p netinfo-core --test lookup_test -- --ignored --nocapture
//! ```

#![allow(dead_code)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use netinfo_core::db::SchemaManager;
use netinfo_core::config::IngestConfig;
use netinfo_core::ingest::{BlockSink, CanonicalBlock};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::info;

// ============================================================================
// In-memory sink
// ============================================================================

/// Stores every batch in memory; optionally fails once `fail_after` batches
/// have been committed
#[derive(Default)]
pub struct MemorySink {
    pub rows: Mutex<Vec<CanonicalBlock>>,
    pub batches: AtomicUsize,
    pub fail_after: Option<usize>,
}

impl MemorySink {
    pub fn failing_after(batches: usize) -> Self {
        Self {
            fail_after: Some(batches),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<CanonicalBlock> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlockSink for MemorySink {
    async fn insert_batch(&self, blocks: &[CanonicalBlock]) -> anyhow::Result<u64> {
        if self
            .fail_after
            .is_some_and(|limit| self.batches.load(Ordering::SeqCst) >= limit)
        {
            anyhow::bail!("simulated storage outage");
        }
        self.rows.lock().unwrap().extend_from_slice(blocks);
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(blocks.len() as u64)
    }
}

// ============================================================================
// Dump fixtures
// ============================================================================

pub fn write_gz(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::fast());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
    path
}

pub fn write_plain(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Ingest config over `dir` with fast retries
pub fn ingest_config(dir: &Path, workers: usize, batch_size: usize) -> IngestConfig {
    IngestConfig {
        dump_dir: dir.to_path_buf(),
        workers,
        batch_size,
        max_retries: 1,
        retry_backoff_ms: 1,
        ..IngestConfig::default()
    }
}

pub fn init_test_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,netinfo_core=debug,sqlx=warn,testcontainers=info")
        }))
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

/// PostgreSQL container with a fresh `block` table
pub struct TestPostgres {
    container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        SchemaManager::new(pool.clone())
            .reset()
            .await
            .context("Failed to create schema")?;

        Ok(Self {
            container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}
