//! Parallel dump workers
//!
//! Files are assigned statically: file `i` goes to worker `i % workers`, and
//! each worker processes its files one after another on a blocking thread.
//! Workers share nothing except the batch channel and an atomic progress
//! counter read only for logging.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn};

use super::decompression::open_dump;
use super::dialect::Dialect;
use super::extractor::{extract, ExtractError};
use super::models::{Batch, DumpFile};
use super::range::UnalignedRangePolicy;
use super::summary::{FileReport, FileStatus};
use super::tokenizer::StanzaTokenizer;

/// Log progress every this many emitted records per file
const PROGRESS_INTERVAL: u64 = 100_000;

/// Knobs shared by all workers of a run
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    /// Target number of blocks per batch
    pub batch_size: usize,
    pub unaligned: UnalignedRangePolicy,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            unaligned: UnalignedRangePolicy::Reject,
        }
    }
}

/// Fixed-size pool of file workers
pub struct IngestionWorkerPool {
    workers: usize,
    settings: WorkerSettings,
}

impl IngestionWorkerPool {
    pub fn new(workers: usize, settings: WorkerSettings) -> Self {
        Self {
            workers: workers.max(1),
            settings,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Static round-robin assignment of files to workers; empty shards are dropped
    pub fn assign(&self, files: Vec<DumpFile>) -> Vec<Vec<DumpFile>> {
        let mut shards: Vec<Vec<DumpFile>> = vec![Vec::new(); self.workers];
        for (i, file) in files.into_iter().enumerate() {
            shards[i % self.workers].push(file);
        }
        shards.retain(|shard| !shard.is_empty());
        shards
    }

    /// Start one blocking worker per shard
    ///
    /// Each handle resolves to the reports of the files in its shard, in
    /// shard order.
    pub fn spawn(
        &self,
        shards: Vec<Vec<DumpFile>>,
        sender: mpsc::Sender<Batch>,
        progress: Arc<AtomicU64>,
    ) -> Vec<JoinHandle<Vec<FileReport>>> {
        shards
            .into_iter()
            .enumerate()
            .map(|(worker, shard)| {
                let sender = sender.clone();
                let progress = progress.clone();
                let settings = self.settings;
                tokio::task::spawn_blocking(move || {
                    run_worker(worker, shard, settings, &sender, &progress)
                })
            })
            .collect()
    }
}

fn run_worker(
    worker: usize,
    shard: Vec<DumpFile>,
    settings: WorkerSettings,
    sender: &mpsc::Sender<Batch>,
    progress: &AtomicU64,
) -> Vec<FileReport> {
    debug!(worker, files = shard.len(), "Worker started");
    let mut reports = Vec::with_capacity(shard.len());
    let mut aborted = false;

    for file in shard {
        if aborted {
            let mut report = FileReport::new(&file.name, file.source);
            report.status = FileStatus::Aborted;
            reports.push(report);
            continue;
        }

        let report = ingest_file(&file, settings, sender, progress);
        aborted = report.status == FileStatus::Aborted;
        reports.push(report);
    }
    reports
}

/// Tokenize, extract and batch one dump file
///
/// Blocks on `sender` when the writer falls behind. A closed channel means
/// the run was aborted and the file is reported as such.
pub fn ingest_file(
    file: &DumpFile,
    settings: WorkerSettings,
    sender: &mpsc::Sender<Batch>,
    progress: &AtomicU64,
) -> FileReport {
    let span = info_span!("ingest_file", file = %file.name, source = %file.source);
    let _guard = span.enter();

    let mut report = FileReport::new(&file.name, file.source);
    let reader = match open_dump(&file.path) {
        Ok(reader) => reader,
        Err(e) => {
            warn!(error = %e, "Failed to open dump");
            report.status = FileStatus::Failed(format!("failed to open: {e}"));
            return report;
        },
    };

    info!("Processing dump");
    let dialect = Dialect::for_source(file.source);
    let batch_size = settings.batch_size.max(1);
    let mut tokenizer = StanzaTokenizer::new(reader, file.source, dialect.tokenizer);
    let mut sequence = 0;
    let mut batch = Batch::with_capacity(&file.name, sequence, batch_size);

    for stanza in tokenizer.by_ref() {
        let stanza = match stanza {
            Ok(stanza) => stanza,
            Err(e) => {
                warn!(error = %e, "Dump unreadable, abandoning file");
                report.status = FileStatus::Failed(format!("read error: {e}"));
                break;
            },
        };
        report.stanzas += 1;

        match extract(&stanza, dialect, settings.unaligned) {
            Ok(blocks) => {
                for block in blocks {
                    batch.blocks.push(block);
                    report.records_emitted += 1;
                    if batch.len() >= batch_size {
                        sequence += 1;
                        let full = std::mem::replace(
                            &mut batch,
                            Batch::with_capacity(&file.name, sequence, batch_size),
                        );
                        if sender.blocking_send(full).is_err() {
                            report.status = FileStatus::Aborted;
                        }
                    }
                    if report.records_emitted % PROGRESS_INTERVAL == 0 {
                        let total = progress.fetch_add(PROGRESS_INTERVAL, Ordering::Relaxed)
                            + PROGRESS_INTERVAL;
                        info!(records = report.records_emitted, total, "Progress");
                    }
                }
            },
            Err(ExtractError::NotABlock(_)) => report.objects_ignored += 1,
            Err(e) => {
                report.records_skipped += 1;
                debug!(line = stanza.line, reason = %e, "Skipping stanza");
            },
        }

        if report.status == FileStatus::Aborted {
            warn!("Writer stopped, abandoning file");
            break;
        }
    }
    report.malformed_lines = tokenizer.malformed_lines();
    progress.fetch_add(report.records_emitted % PROGRESS_INTERVAL, Ordering::Relaxed);

    if report.status != FileStatus::Aborted && !batch.is_empty() && sender.blocking_send(batch).is_err() {
        report.status = FileStatus::Aborted;
    }

    info!(
        status = report.status.as_str(),
        stanzas = report.stanzas,
        emitted = report.records_emitted,
        skipped = report.records_skipped,
        ignored = report.objects_ignored,
        malformed = report.malformed_lines,
        "Finished dump"
    );
    report
}
