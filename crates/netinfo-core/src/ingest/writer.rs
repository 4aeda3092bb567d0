//! Batched, retried writes of canonical blocks
//!
//! [`BlockSink`] is the storage seam: [`PgBlockSink`] in production, an
//! in-memory sink in tests. [`BatchWriter`] is the only caller of a sink
//! during a run and owns retry and accounting.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::models::{Batch, CanonicalBlock};
use super::IngestError;
use crate::db::schema::BLOCK_TABLE;

/// Rows per INSERT statement; 10 binds per row stays under Postgres' 65535 limit
pub const DEFAULT_INSERT_CHUNK_SIZE: usize = 5_000;

/// Destination of canonical blocks
#[async_trait]
pub trait BlockSink: Send + Sync {
    /// Insert all blocks atomically, returning the number of rows written
    async fn insert_batch(&self, blocks: &[CanonicalBlock]) -> anyhow::Result<u64>;
}

/// Postgres sink writing into the `block` table
pub struct PgBlockSink {
    pool: PgPool,
    import_date: DateTime<Utc>,
}

impl PgBlockSink {
    /// Every row written through this sink carries `import_date`
    pub fn new(pool: PgPool, import_date: DateTime<Utc>) -> Self {
        Self {
            pool,
            import_date,
        }
    }
}

#[async_trait]
impl BlockSink for PgBlockSink {
    async fn insert_batch(&self, blocks: &[CanonicalBlock]) -> anyhow::Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin batch transaction")?;

        let mut inserted = 0;
        for chunk in blocks.chunks(DEFAULT_INSERT_CHUNK_SIZE) {
            let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                r#"
                INSERT INTO {BLOCK_TABLE} (
                    inetnum,
                    netname,
                    description,
                    country,
                    maintained_by,
                    created,
                    last_modified,
                    source,
                    status,
                    import_date
                )
                "#
            ));

            query_builder.push_values(chunk, |mut b, block| {
                b.push_bind(block.inetnum.to_string())
                    .push_unseparated("::cidr")
                    .push_bind(&block.netname)
                    .push_bind(&block.description)
                    .push_bind(&block.country)
                    .push_bind(&block.maintained_by)
                    .push_bind(block.created)
                    .push_bind(block.last_modified)
                    .push_bind(block.source.as_str())
                    .push_bind(&block.status)
                    .push_bind(self.import_date);
            });

            let result = query_builder
                .build()
                .execute(&mut *tx)
                .await
                .context("Failed to insert blocks")?;
            inserted += result.rows_affected();
        }

        tx.commit().await.context("Failed to commit batch")?;
        Ok(inserted)
    }
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn delay(&self, retry: u32) -> Duration {
        self.backoff
            .saturating_mul(1u32 << retry.saturating_sub(1).min(6))
    }
}

/// Single writer draining batches into a [`BlockSink`]
pub struct BatchWriter {
    sink: Arc<dyn BlockSink>,
    retry: RetryPolicy,
    rows_written: u64,
    batches_committed: u64,
}

impl BatchWriter {
    pub fn new(sink: Arc<dyn BlockSink>, retry: RetryPolicy) -> Self {
        Self {
            sink,
            retry,
            rows_written: 0,
            batches_committed: 0,
        }
    }

    /// Commit one batch, retrying on failure
    ///
    /// Empty batches are a no-op. Exhausting the retries returns
    /// [`IngestError::StorageExhausted`] carrying what was committed so far.
    pub async fn write(&mut self, batch: &Batch) -> Result<u64, IngestError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut retry = 0;
        loop {
            match self.sink.insert_batch(&batch.blocks).await {
                Ok(rows) => {
                    self.rows_written += rows;
                    self.batches_committed += 1;
                    debug!(
                        file = %batch.file,
                        sequence = batch.sequence,
                        rows,
                        total_rows = self.rows_written,
                        "Committed batch"
                    );
                    return Ok(rows);
                },
                Err(e) if retry < self.retry.max_retries => {
                    retry += 1;
                    let delay = self.retry.delay(retry);
                    warn!(
                        file = %batch.file,
                        sequence = batch.sequence,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %format!("{e:#}"),
                        "Batch insert failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(e) => {
                    error!(
                        file = %batch.file,
                        sequence = batch.sequence,
                        rows_committed = self.rows_written,
                        error = %format!("{e:#}"),
                        "Batch insert failed, giving up"
                    );
                    return Err(IngestError::StorageExhausted {
                        attempts: retry + 1,
                        rows_committed: self.rows_written,
                        batches_committed: self.batches_committed,
                        reason: format!("{e:#}"),
                    });
                },
            }
        }
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    pub fn batches_committed(&self) -> u64 {
        self.batches_committed
    }
}
