//! Stanza → canonical block extraction
//!
//! [`extract`] is a pure function of one stanza and its dialect, so workers
//! can run it in parallel without coordination.

use thiserror::Error;
use tracing::debug;

use super::dialect::{contains_key, Dialect};
use super::models::{CanonicalBlock, RawStanza};
use super::range::{normalize_with, RangeError, UnalignedRangePolicy};

/// Why a stanza produced no block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Not an address-block object (person, mntner, aut-num, ...)
    #[error("not an address block: {0}")]
    NotABlock(String),

    #[error("no address range")]
    NoRange,

    #[error(transparent)]
    InvalidRange(#[from] RangeError),
}

impl ExtractError {
    /// Ignored objects are expected; everything else is a rejected block
    pub fn is_ignored(&self) -> bool {
        matches!(self, ExtractError::NotABlock(_))
    }
}

/// Extract canonical blocks from one stanza
///
/// Returns one block per CIDR; more than one only when `policy` splits an
/// unaligned dashed range.
pub fn extract(
    stanza: &RawStanza,
    dialect: &Dialect,
    policy: UnalignedRangePolicy,
) -> Result<Vec<CanonicalBlock>, ExtractError> {
    let (class, range) = stanza
        .attributes
        .first()
        .ok_or(ExtractError::NoRange)?;
    if !dialect.is_block_class(class) {
        return Err(ExtractError::NotABlock(class.to_ascii_lowercase()));
    }
    if range.trim().is_empty() {
        return Err(ExtractError::NoRange);
    }
    let networks = normalize_with(range, policy)?;
    let Some(&first) = networks.first() else {
        return Err(ExtractError::NoRange);
    };

    let unmapped = unmapped_keys(stanza, dialect);
    if !unmapped.is_empty() {
        debug!(source = %dialect.source, line = stanza.line, keys = ?unmapped, "Ignoring unmapped keys");
    }

    let netname = join(stanza, dialect.netname_keys, " ")
        .or_else(|| join(stanza, dialect.netname_fallback_keys, " "));
    let country = match (
        join(stanza, dialect.country_keys, " "),
        join(stanza, dialect.city_keys, " "),
    ) {
        (Some(country), Some(city)) => Some(format!("{country} - {city}")),
        (country, _) => country,
    };
    let created = first_timestamp(stanza, dialect, dialect.created_keys);
    let last_modified = first_timestamp(stanza, dialect, dialect.last_modified_keys)
        .or_else(|| latest_changed(stanza, dialect));

    let template = CanonicalBlock {
        inetnum: first,
        netname,
        description: join(stanza, dialect.description_keys, "\n"),
        country,
        maintained_by: join(stanza, dialect.maintainer_keys, " "),
        status: join(stanza, dialect.status_keys, " "),
        source: dialect.source,
        created,
        last_modified,
    };

    Ok(networks
        .into_iter()
        .map(|inetnum| CanonicalBlock {
            inetnum,
            ..template.clone()
        })
        .collect())
}

/// Distinct keys of a block stanza that no column reads, in file order
pub fn unmapped_keys<'a>(stanza: &'a RawStanza, dialect: &Dialect) -> Vec<&'a str> {
    let mut unmapped: Vec<&str> = Vec::new();
    for (key, _) in stanza.attributes.iter().skip(1) {
        if !dialect.is_mapped(key) && !unmapped.iter().any(|seen| seen.eq_ignore_ascii_case(key)) {
            unmapped.push(key);
        }
    }
    unmapped
}

/// Values of all `keys` in file order, whitespace-collapsed, joined by `separator`
fn join(stanza: &RawStanza, keys: &[&str], separator: &str) -> Option<String> {
    let values: Vec<String> = stanza
        .attributes
        .iter()
        .filter(|(key, _)| contains_key(keys, key))
        .map(|(_, value)| collapse_whitespace(value))
        .filter(|value| !value.is_empty())
        .collect();
    (!values.is_empty()).then(|| values.join(separator))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_timestamp(
    stanza: &RawStanza,
    dialect: &Dialect,
    keys: &[&str],
) -> Option<chrono::DateTime<chrono::Utc>> {
    stanza
        .attributes
        .iter()
        .filter(|(key, _)| contains_key(keys, key))
        .find_map(|(key, value)| {
            let parsed = dialect.parse_timestamp(value);
            if parsed.is_none() {
                debug!(key = %key, value = %value, line = stanza.line, "Ignoring unparseable date");
            }
            parsed
        })
}

fn latest_changed(stanza: &RawStanza, dialect: &Dialect) -> Option<chrono::DateTime<chrono::Utc>> {
    stanza
        .attributes
        .iter()
        .filter(|(key, _)| contains_key(dialect.changed_keys, key))
        .filter_map(|(_, value)| dialect.parse_changed(value))
        .max()
}
