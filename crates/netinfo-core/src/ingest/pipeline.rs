//! Ingestion run orchestration
//!
//! # Example
//!
//! ```rust,ignore
//! use netinfo_core::config::IngestConfig;
//! use netinfo_core::db::{create_pool, DbConfig};
//! use netinfo_core::ingest::rebuild;
//!
//! let pool = create_pool(&DbConfig::from_env()?).await?;
//! let summary = rebuild(&pool, &IngestConfig::from_env()).await?;
//! println!("{} rows", summary.rows_written);
//! ```

use chrono::{DateTime, Utc};
use futures::future::join_all;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::models::{Batch, DumpFile};
use super::summary::{FileReport, RunSummary};
use super::worker::{IngestionWorkerPool, WorkerSettings};
use super::writer::{BatchWriter, BlockSink, PgBlockSink};
use super::{IngestError, Result};
use crate::config::IngestConfig;
use crate::db::schema::SchemaManager;

/// One ingestion run over the configured dump directory
pub struct IngestPipeline {
    config: IngestConfig,
    started_at: DateTime<Utc>,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            started_at: Utc::now(),
        }
    }

    /// Wall-clock start of the run, stored as `import_date`
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Resolve the file catalogue against the dump directory
    ///
    /// Returns the files to process and reports for the missing ones. A
    /// missing `name.gz` falls back to an uncompressed `name`. Files of
    /// registries outside `sources` are left out of both lists.
    pub fn discover(&self) -> (Vec<DumpFile>, Vec<FileReport>) {
        let mut present = Vec::new();
        let mut missing = Vec::new();

        for name in &self.config.files {
            let Some(file) = DumpFile::from_path(self.config.dump_dir.join(name)) else {
                warn!(file = %name, "No registry matches file name, skipping");
                continue;
            };
            if !self.config.selects(file.source) {
                debug!(file = %name, source = %file.source, "Registry not selected, skipping");
                continue;
            }

            if file.path.is_file() {
                present.push(file);
                continue;
            }
            let plain = name
                .strip_suffix(".gz")
                .and_then(|stem| DumpFile::from_path(self.config.dump_dir.join(stem)))
                .filter(|plain| plain.path.is_file());
            match plain {
                Some(plain) => present.push(plain),
                None => {
                    warn!(file = %file.path.display(), "Dump file missing");
                    missing.push(FileReport::missing(&file.name, file.source));
                },
            }
        }
        (present, missing)
    }

    /// Ingest every present dump file into `sink`
    ///
    /// Does not touch the schema. Returns an error only when the run as a
    /// whole cannot continue; per-file problems are in the summary.
    pub async fn run(&self, sink: Arc<dyn BlockSink>) -> Result<RunSummary> {
        let (files, missing) = self.discover();
        if files.is_empty() {
            return Err(IngestError::NoInput(self.config.dump_dir.display().to_string()));
        }
        self.run_files(files, missing, sink).await
    }

    /// Ingest an explicit list of files
    pub async fn run_files(
        &self,
        files: Vec<DumpFile>,
        missing: Vec<FileReport>,
        sink: Arc<dyn BlockSink>,
    ) -> Result<RunSummary> {
        let timer = Instant::now();
        let order: HashMap<String, usize> = self
            .config
            .files
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_end_matches(".gz").to_string(), i))
            .collect();

        let pool = IngestionWorkerPool::new(
            self.config.workers,
            WorkerSettings {
                batch_size: self.config.batch_size,
                unaligned: self.config.unaligned_policy(),
            },
        );
        info!(
            files = files.len(),
            missing = missing.len(),
            workers = pool.workers(),
            batch_size = self.config.batch_size,
            "Starting ingestion run"
        );

        let shards = pool.assign(files);
        let assigned: Vec<Vec<DumpFile>> = shards.clone();

        let (sender, mut receiver) = mpsc::channel::<Batch>(self.config.channel_capacity());
        let retry = self.config.retry_policy();
        let writer = tokio::spawn(async move {
            let mut writer = BatchWriter::new(sink, retry);
            while let Some(batch) = receiver.recv().await {
                writer.write(&batch).await?;
            }
            Ok::<_, IngestError>((writer.rows_written(), writer.batches_committed()))
        });

        let progress = Arc::new(AtomicU64::new(0));
        let handles = pool.spawn(shards, sender, progress);

        let mut reports = missing;
        for (result, shard) in join_all(handles).await.into_iter().zip(assigned) {
            match result {
                Ok(shard_reports) => reports.extend(shard_reports),
                Err(e) => {
                    let err = IngestError::WorkerPanic(e.to_string());
                    error!(error = %err, files = shard.len(), "Worker failed");
                    reports.extend(
                        shard
                            .into_iter()
                            .map(|f| FileReport::failed(f.name, f.source, err.to_string())),
                    );
                },
            }
        }

        let (rows_written, batches_committed) = match writer.await {
            Ok(Ok(counts)) => counts,
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(IngestError::Writer(e.to_string())),
        };

        reports.sort_by_key(|r| {
            order
                .get(r.file.trim_end_matches(".gz"))
                .copied()
                .unwrap_or(usize::MAX)
        });

        let summary = RunSummary {
            started_at: self.started_at,
            duration: timer.elapsed(),
            files: reports,
            rows_written,
            batches_committed,
        };
        info!(
            rows = summary.rows_written,
            batches = summary.batches_committed,
            skipped = summary.records_skipped(),
            duration_secs = summary.duration.as_secs(),
            succeeded = summary.succeeded(),
            "Ingestion run finished"
        );
        Ok(summary)
    }
}

/// Full rebuild: reset the schema, then ingest into Postgres
pub async fn rebuild(pool: &PgPool, config: &IngestConfig) -> Result<RunSummary> {
    SchemaManager::new(pool.clone()).reset().await?;
    ingest_into(pool, config).await
}

/// Ingest into the existing `block` table, creating it if absent
pub async fn ingest_into(pool: &PgPool, config: &IngestConfig) -> Result<RunSummary> {
    SchemaManager::new(pool.clone()).ensure().await?;
    let pipeline = IngestPipeline::new(config.clone());
    let sink = Arc::new(PgBlockSink::new(pool.clone(), pipeline.started_at()));
    pipeline.run(sink).await
}
