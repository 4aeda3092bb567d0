//! netinfo CLI Library
//!
//! Command-line entry points over `netinfo-core`.
//!
//! # Overview
//!
//! - **Ingestion**: load the RIR dumps into Postgres (`netinfo ingest`)
//! - **Lookup**: blocks containing an address or prefix (`netinfo lookup`)
//! - **Search**: by netname, description or country (`netinfo search ...`)
//! - **Stats**: row counts per registry (`netinfo stats`)

pub mod commands;
pub mod error;
pub mod render;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use netinfo_core::ingest::Source;
use std::path::PathBuf;

/// netinfo - RIR WHOIS address block database
#[derive(Parser, Debug)]
#[command(name = "netinfo")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Postgres connection string
    #[arg(short = 'c', long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub connection_string: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rebuild the block table from the dump directory
    Ingest(IngestArgs),

    /// Blocks containing an IP address or CIDR, most specific first
    Lookup {
        /// IPv4/IPv6 address or CIDR
        address: String,
    },

    /// Text searches over the block table
    Search {
        #[command(subcommand)]
        command: SearchCommand,
    },

    /// Row counts per registry
    Stats,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct IngestArgs {
    /// Directory holding the registry dumps
    #[arg(long, env = "NETINFO_DUMP_DIR")]
    pub dump_dir: Option<PathBuf>,

    /// Parallel parser workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Rows per insert transaction
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Append to the existing table instead of dropping it first
    #[arg(long)]
    pub no_reset: bool,

    /// Store unaligned dashed ranges as several exact CIDR blocks
    #[arg(long)]
    pub split_unaligned: bool,

    /// Only ingest dumps of this registry (repeatable; default: all)
    #[arg(long = "source", value_name = "REGISTRY")]
    pub sources: Vec<Source>,
}

/// Search subcommands
#[derive(Subcommand, Debug)]
pub enum SearchCommand {
    /// Match on netname
    Netname {
        name: String,

        /// Case-insensitive equality instead of substring
        #[arg(long)]
        exact: bool,

        /// Maximum rows (1-100)
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Full-text search on the description
    Description {
        /// Search words
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Maximum rows (1-100)
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Blocks registered to a country code
    Country {
        code: String,

        /// Only netnames containing this term
        #[arg(long)]
        netname: Option<String>,

        /// Maximum rows (1-100)
        #[arg(short, long)]
        limit: Option<i64>,
    },
}
