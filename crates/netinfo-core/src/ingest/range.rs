//! Address range normalization
//!
//! Registry dumps describe address blocks in several notations. Everything is
//! converted to canonical CIDR before it reaches storage:
//!
//! - CIDR: `193.0.0.0/21`, `2001:DB8:0::/32` (IPv6 is re-rendered compressed, lowercase)
//! - Abbreviated IPv4 CIDR as published by LACNIC: `177.46.7/24` → `177.46.7.0/24`
//! - Network with a dotted netmask: `10.0.0.0/255.255.0.0` → `10.0.0.0/16`
//! - Dashed range: `193.0.0.0 - 193.0.7.255` → `193.0.0.0/21`
//! - Bare address: `192.0.2.1` → `192.0.2.1/32`
//!
//! A dashed range that does not cover exactly one CIDR block is rejected by
//! default. [`UnalignedRangePolicy::Split`] instead decomposes it into the
//! minimal list of exact blocks covering the same addresses.
//!
//! # Examples
//!
//! ```rust
//! use netinfo_core::ingest::range::{normalize, RangeError};
//!
//! assert_eq!(normalize("8.8.8.0 - 8.8.8.255").unwrap().to_string(), "8.8.8.0/24");
//! assert!(matches!(normalize("8.8.8.0 - 8.8.9.127"), Err(RangeError::Unaligned(_))));
//! ```

use ipnet::{IpNet, Ipv4Subnets, Ipv6Subnets};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Why a raw range string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("empty range")]
    Empty,

    #[error("invalid address in range '{0}'")]
    InvalidAddress(String),

    #[error("invalid prefix length in range '{0}'")]
    InvalidPrefix(String),

    #[error("host bits set in '{0}'")]
    HostBitsSet(String),

    #[error("range '{0}' mixes IPv4 and IPv6")]
    MixedFamilies(String),

    #[error("range '{0}' starts after it ends")]
    Inverted(String),

    #[error("range '{0}' is not a single CIDR block")]
    Unaligned(String),
}

/// What to do with a dashed range that is not a single CIDR block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnalignedRangePolicy {
    /// Drop the range (counted as skipped)
    #[default]
    Reject,
    /// Emit the minimal set of exact CIDR blocks covering the range
    Split,
}

/// Normalize a raw range into exactly one CIDR block
pub fn normalize(raw: &str) -> Result<IpNet, RangeError> {
    match parse(raw)? {
        Parsed::Net(net) => Ok(net),
        Parsed::Range(blocks) => match blocks.as_slice() {
            [net] => Ok(*net),
            _ => Err(RangeError::Unaligned(raw.trim().to_string())),
        },
    }
}

/// Normalize a raw range, applying `policy` to unaligned dashed ranges
///
/// Always returns at least one block on success.
pub fn normalize_with(raw: &str, policy: UnalignedRangePolicy) -> Result<Vec<IpNet>, RangeError> {
    match (parse(raw)?, policy) {
        (Parsed::Net(net), _) => Ok(vec![net]),
        (Parsed::Range(blocks), UnalignedRangePolicy::Split) => Ok(blocks),
        (Parsed::Range(blocks), UnalignedRangePolicy::Reject) if blocks.len() == 1 => Ok(blocks),
        (Parsed::Range(_), UnalignedRangePolicy::Reject) => {
            Err(RangeError::Unaligned(raw.trim().to_string()))
        },
    }
}

enum Parsed {
    Net(IpNet),
    /// Minimal CIDR cover of a dashed range, in address order
    Range(Vec<IpNet>),
}

fn parse(raw: &str) -> Result<Parsed, RangeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RangeError::Empty);
    }

    if let Some((first, last)) = trimmed.split_once('-') {
        let start = parse_addr(first.trim(), trimmed)?;
        let end = parse_addr(last.trim(), trimmed)?;
        let blocks: Vec<IpNet> = match (start, end) {
            (IpAddr::V4(start), IpAddr::V4(end)) if start <= end => {
                Ipv4Subnets::new(start, end, 0).map(IpNet::V4).collect()
            },
            (IpAddr::V6(start), IpAddr::V6(end)) if start <= end => {
                Ipv6Subnets::new(start, end, 0).map(IpNet::V6).collect()
            },
            (IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
                return Err(RangeError::Inverted(trimmed.to_string()));
            },
            _ => return Err(RangeError::MixedFamilies(trimmed.to_string())),
        };
        return Ok(Parsed::Range(blocks));
    }

    if let Some((addr, len)) = trimmed.split_once('/') {
        let (addr, len) = (addr.trim(), len.trim());
        let addr = match addr.parse::<IpAddr>() {
            Ok(addr) => addr,
            Err(_) => pad_ipv4(addr)
                .map(IpAddr::V4)
                .ok_or_else(|| RangeError::InvalidAddress(trimmed.to_string()))?,
        };
        let prefix = parse_prefix(addr, len)
            .ok_or_else(|| RangeError::InvalidPrefix(trimmed.to_string()))?;
        let net = IpNet::new(addr, prefix)
            .map_err(|_| RangeError::InvalidPrefix(trimmed.to_string()))?;
        if net.network() != addr {
            return Err(RangeError::HostBitsSet(trimmed.to_string()));
        }
        return Ok(Parsed::Net(net));
    }

    let addr = parse_addr(trimmed, trimmed)?;
    let host_len = if addr.is_ipv4() { 32 } else { 128 };
    IpNet::new(addr, host_len)
        .map(Parsed::Net)
        .map_err(|_| RangeError::InvalidPrefix(trimmed.to_string()))
}

fn parse_addr(part: &str, raw: &str) -> Result<IpAddr, RangeError> {
    part.parse::<IpAddr>()
        .map_err(|_| RangeError::InvalidAddress(raw.to_string()))
}

/// Prefix length from `/n` or, for IPv4, a dotted netmask
fn parse_prefix(addr: IpAddr, len: &str) -> Option<u8> {
    if addr.is_ipv4() && len.contains('.') {
        let mask = u32::from(len.parse::<Ipv4Addr>().ok()?);
        let ones = mask.leading_ones();
        // contiguous masks only
        return (mask.checked_shl(ones).unwrap_or(0) == 0).then_some(ones as u8);
    }
    len.parse::<u8>().ok()
}

/// Pad an abbreviated IPv4 network (`148.204` → `148.204.0.0`)
fn pad_ipv4(addr: &str) -> Option<Ipv4Addr> {
    let octets: Vec<&str> = addr.split('.').collect();
    if octets.is_empty() || octets.len() >= 4 {
        return None;
    }
    let mut padded = [0u8; 4];
    for (slot, octet) in padded.iter_mut().zip(&octets) {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = octet.parse().ok()?;
    }
    Some(Ipv4Addr::from(padded))
}
