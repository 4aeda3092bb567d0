//! Data models for registry dump ingestion

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Dump files published by the registries, in processing order
pub const DUMP_FILES: &[&str] = &[
    "afrinic.db.gz",
    "apnic.db.inet6num.gz",
    "apnic.db.inetnum.gz",
    "arin.db.gz",
    "lacnic.db.gz",
    "ripe.db.inetnum.gz",
    "ripe.db.inet6num.gz",
];

/// Regional Internet Registry that published a dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Afrinic,
    Apnic,
    Arin,
    Lacnic,
    Ripe,
}

impl Source {
    pub const ALL: [Source; 5] = [
        Source::Afrinic,
        Source::Apnic,
        Source::Arin,
        Source::Lacnic,
        Source::Ripe,
    ];

    /// Tag stored in the `source` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Afrinic => "afrinic",
            Source::Apnic => "apnic",
            Source::Arin => "arin",
            Source::Lacnic => "lacnic",
            Source::Ripe => "ripe",
        }
    }

    /// Infer the registry from a dump file name
    ///
    /// LACNIC publishes under several names (`lacnic.db.gz`,
    /// `delegated-lacnic-extended-latest`), so it matches anywhere in the name.
    pub fn from_filename(name: &str) -> Option<Source> {
        let name = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
        if name.starts_with("afrinic") {
            Some(Source::Afrinic)
        } else if name.starts_with("apnic") {
            Some(Source::Apnic)
        } else if name.starts_with("arin") {
            Some(Source::Arin)
        } else if name.contains("lacnic") {
            Some(Source::Lacnic)
        } else if name.starts_with("ripe") {
            Some(Source::Ripe)
        } else {
            None
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = netinfo_common::NetinfoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| netinfo_common::NetinfoError::Parse(format!("unknown registry '{s}'")))
    }
}

/// A dump file on disk and the registry it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpFile {
    pub name: String,
    pub path: PathBuf,
    pub source: Source,
}

impl DumpFile {
    /// `None` when the file name does not identify a registry
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let name = path.file_name()?.to_string_lossy().into_owned();
        let source = Source::from_filename(&name)?;
        Some(Self {
            name,
            path: path.to_path_buf(),
            source,
        })
    }
}

/// One blank-line-delimited paragraph of a dump, as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStanza {
    pub source: Source,
    /// 1-based line number of the first attribute
    pub line: usize,
    /// `(key, value)` pairs in file order, continuation lines already folded in
    pub attributes: Vec<(String, String)>,
}

impl RawStanza {
    pub fn new(source: Source, line: usize) -> Self {
        Self {
            source,
            line,
            attributes: Vec::new(),
        }
    }
}

/// A network block in canonical form, ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalBlock {
    pub inetnum: IpNet,
    pub netname: Option<String>,
    pub description: Option<String>,
    pub country: Option<String>,
    pub maintained_by: Option<String>,
    pub status: Option<String>,
    pub source: Source,
    pub created: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl CanonicalBlock {
    /// A block with only the mandatory fields set
    pub fn new(inetnum: IpNet, source: Source) -> Self {
        Self {
            inetnum,
            netname: None,
            description: None,
            country: None,
            maintained_by: None,
            status: None,
            source,
            created: None,
            last_modified: None,
        }
    }
}

/// Ordered group of blocks flushed as one insert transaction
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// Dump file the blocks came from
    pub file: String,
    /// Position of this batch within its file, starting at 0
    pub sequence: u64,
    pub blocks: Vec<CanonicalBlock>,
}

impl Batch {
    pub fn with_capacity(file: impl Into<String>, sequence: u64, capacity: usize) -> Self {
        Self {
            file: file.into(),
            sequence,
            blocks: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
