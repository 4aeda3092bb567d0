//! Registry dump ingestion
//!
//! Turns the RIR WHOIS dumps into rows of the `block` table:
//!
//! ```text
//! dump files ──► IngestionWorkerPool (one blocking worker per CPU, whole files)
//!                  │  StanzaTokenizer → extract(Dialect) → range::normalize
//!                  ▼
//!            bounded channel of Batch
//!                  ▼
//!            BatchWriter (single consumer, one transaction per batch)
//!                  ▼
//!            BlockSink (PgBlockSink in production)
//! ```
//!
//! Schema reset is not part of [`IngestPipeline::run`]; callers invoke
//! [`crate::db::schema::SchemaManager`] first, or use [`rebuild`].

pub mod decompression;
pub mod dialect;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod range;
pub mod summary;
pub mod tokenizer;
pub mod worker;
pub mod writer;

pub use dialect::Dialect;
pub use extractor::{extract, ExtractError};
pub use models::{Batch, CanonicalBlock, DumpFile, RawStanza, Source, DUMP_FILES};
pub use pipeline::{ingest_into, rebuild, IngestPipeline};
pub use range::{normalize, normalize_with, RangeError, UnalignedRangePolicy};
pub use summary::{FileReport, FileStatus, RunSummary};
pub use tokenizer::{StanzaTokenizer, TokenizerOptions};
pub use worker::{IngestionWorkerPool, WorkerSettings};
pub use writer::{BatchWriter, BlockSink, PgBlockSink, RetryPolicy};

/// Result type for run-level ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors that stop an ingestion run
///
/// Stanza and file problems never show up here; they are counted in the
/// [`RunSummary`].
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Schema error: {0}")]
    Schema(#[from] crate::db::DbError),

    #[error(
        "Storage failed after {attempts} attempts ({batches_committed} batches / {rows_committed} rows committed): {reason}"
    )]
    StorageExhausted {
        attempts: u32,
        rows_committed: u64,
        batches_committed: u64,
        reason: String,
    },

    #[error("Worker panicked: {0}")]
    WorkerPanic(String),

    #[error("No dump files found in {0}")]
    NoInput(String),

    #[error("Writer task failed: {0}")]
    Writer(String),
}
