//! Per-file and per-run ingestion reports
//!
//! Workers never share counters; each returns one [`FileReport`] per file it
//! owned and the orchestrator folds them into a [`RunSummary`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use super::models::Source;

/// Outcome of one dump file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum FileStatus {
    Completed,
    /// Listed in the catalogue but absent from the dump directory
    Missing,
    /// Unreadable or corrupt; blocks flushed before the failure stay committed
    Failed(String),
    /// Stopped because the run was aborted by a storage failure
    Aborted,
}

impl FileStatus {
    pub fn as_str(&self) -> &str {
        match self {
            FileStatus::Completed => "completed",
            FileStatus::Missing => "missing",
            FileStatus::Failed(_) => "failed",
            FileStatus::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub source: Source,
    pub status: FileStatus,
    /// Stanzas read, including ignored and skipped ones
    pub stanzas: u64,
    /// Blocks handed to the writer
    pub records_emitted: u64,
    /// Block candidates rejected (bad range, no range)
    pub records_skipped: u64,
    /// Non-block objects (person, mntner, ...)
    pub objects_ignored: u64,
    pub malformed_lines: u64,
}

impl FileReport {
    pub fn new(file: impl Into<String>, source: Source) -> Self {
        Self {
            file: file.into(),
            source,
            status: FileStatus::Completed,
            stanzas: 0,
            records_emitted: 0,
            records_skipped: 0,
            objects_ignored: 0,
            malformed_lines: 0,
        }
    }

    pub fn missing(file: impl Into<String>, source: Source) -> Self {
        Self {
            status: FileStatus::Missing,
            ..Self::new(file, source)
        }
    }

    pub fn failed(file: impl Into<String>, source: Source, reason: impl Into<String>) -> Self {
        Self {
            status: FileStatus::Failed(reason.into()),
            ..Self::new(file, source)
        }
    }
}

/// Result of one full ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub files: Vec<FileReport>,
    /// Rows committed by the writer
    pub rows_written: u64,
    pub batches_committed: u64,
}

impl RunSummary {
    /// True when every file that was present completed
    pub fn succeeded(&self) -> bool {
        self.files
            .iter()
            .all(|f| matches!(f.status, FileStatus::Completed | FileStatus::Missing))
    }

    pub fn files_processed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status != FileStatus::Missing)
            .count()
    }

    pub fn records_emitted(&self) -> u64 {
        self.files.iter().map(|f| f.records_emitted).sum()
    }

    pub fn records_skipped(&self) -> u64 {
        self.files.iter().map(|f| f.records_skipped).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Failed(_) | FileStatus::Aborted))
    }
}
