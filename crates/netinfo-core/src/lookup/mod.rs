//! Read-only query layer over the `block` table
//!
//! Every call validates its input first and returns either rows (possibly
//! none) or a [`LookupError`]. Storage faults are wrapped; the driver
//! message never becomes the user-facing text.

pub mod service;
pub mod validation;

pub use service::{BlockRecord, LookupService, SourceCount, Stats, MAX_LOOKUP_RESULTS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("'{0}' is not a valid IP address or CIDR")]
    InvalidAddress(String),

    #[error("Search term must contain at least {min} letters, digits, '-', '_' or '.'")]
    TermTooShort { min: usize },

    #[error("'{0}' is not a valid country code")]
    InvalidCountry(String),

    #[error("'{0}' cannot be matched exactly: only letters, digits, '-', '_' and '.' are allowed")]
    InexactTerm(String),

    #[error("Lookup failed: database unavailable")]
    Storage(#[source] sqlx::Error),
}

impl LookupError {
    /// True for rejected input, false for storage faults
    pub fn is_validation(&self) -> bool {
        !matches!(self, LookupError::Storage(_))
    }
}

impl From<sqlx::Error> for LookupError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!(error = %err, "Lookup query failed");
        LookupError::Storage(err)
    }
}
