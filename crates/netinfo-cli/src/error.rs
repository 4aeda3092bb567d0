//! Error types for the netinfo CLI
//!
//! Messages are user-facing; each variant says what to check next.

use netinfo_core::db::DbError;
use netinfo_core::{IngestError, LookupError};
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or .env file.")]
    Config(String),

    /// Rejected query input or failed query
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// Ingestion run stopped
    #[error("Ingestion failed: {0}")]
    Ingest(#[from] IngestError),

    /// Pool could not be created
    #[error("Database error: {0}. Check the connection string and that Postgres is running.")]
    Database(#[from] DbError),

    /// Run finished but some dump files could not be read
    #[error("{failed} dump file(s) failed; see the summary above")]
    IncompleteRun { failed: usize },

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit code: 2 for bad input, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Lookup(e) if e.is_validation() => 2,
            CliError::Config(_) => 2,
            _ => 1,
        }
    }
}
