//! netinfo core library
//!
//! Loads the bulk WHOIS dumps of the five Regional Internet Registries into
//! Postgres and answers containment and text-search queries over them.
//!
//! # Modules
//!
//! - [`config`]: environment-driven configuration
//! - [`db`]: connection pool and the `block` table schema
//! - [`ingest`]: dump tokenizer, registry dialects, range normalizer, worker pool, batch writer
//! - [`lookup`]: validated read-only queries
//!
//! # Example
//!
//! ```rust,ignore
//! use netinfo_core::{db::{create_pool, DbConfig}, lookup::LookupService};
//!
//! let pool = create_pool(&DbConfig::from_env()?).await?;
//! let rows = LookupService::new(pool).lookup("8.8.8.8").await?;
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod db;
pub mod ingest;
pub mod lookup;

pub use config::{Config, IngestConfig};
pub use ingest::{CanonicalBlock, IngestError, RunSummary, Source};
pub use lookup::{LookupError, LookupService};
