//! Input validation for lookup and search
//!
//! Everything a caller passes is checked and normalized here before any SQL
//! is built; the query layer only ever sees values produced by these
//! functions.
//!
//! # Examples
//!
//! ```rust
//! use netinfo_core::lookup::validation::{clamp_limit, parse_ip_or_cidr, sanitize_term};
//!
//! assert_eq!(parse_ip_or_cidr("8.8.8.8").unwrap().to_string(), "8.8.8.8/32");
//! assert_eq!(sanitize_term("Google; DROP TABLE").unwrap(), "Google DROP TABLE");
//! assert_eq!(clamp_limit(Some(5000)), 100);
//! ```

use ipnet::IpNet;
use std::net::IpAddr;

use super::LookupError;

pub const DEFAULT_SEARCH_LIMIT: i64 = 20;
pub const MAX_SEARCH_LIMIT: i64 = 100;
pub const MAX_TERM_LENGTH: usize = 200;
pub const MIN_TERM_LENGTH: usize = 2;

/// Parse an address or CIDR into the network to look up
///
/// A bare address becomes a host route. Host bits in a CIDR are cleared
/// (`8.8.8.1/24` → `8.8.8.0/24`).
pub fn parse_ip_or_cidr(input: &str) -> Result<IpNet, LookupError> {
    let input = input.trim();
    if let Ok(addr) = input.parse::<IpAddr>() {
        let host_len = if addr.is_ipv4() { 32 } else { 128 };
        return IpNet::new(addr, host_len).map_err(|_| LookupError::InvalidAddress(input.to_string()));
    }
    input
        .parse::<IpNet>()
        .map(|net| net.trunc())
        .map_err(|_| LookupError::InvalidAddress(input.to_string()))
}

/// Strip everything but word characters, whitespace, `-` and `.`, then
/// truncate to [`MAX_TERM_LENGTH`] characters
///
/// Fails when fewer than [`MIN_TERM_LENGTH`] characters remain.
pub fn sanitize_term(term: &str) -> Result<String, LookupError> {
    let cleaned: String = term
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '-' | '.'))
        .take(MAX_TERM_LENGTH)
        .collect();
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() < MIN_TERM_LENGTH {
        return Err(LookupError::TermTooShort {
            min: MIN_TERM_LENGTH,
        });
    }
    Ok(cleaned)
}

/// Term for an exact match, which must survive [`sanitize_term`] unchanged
///
/// Whitespace is still collapsed; any stripped or truncated character is
/// rejected instead, so an exact search never matches a different name.
pub fn exact_term(term: &str) -> Result<String, LookupError> {
    let cleaned = sanitize_term(term)?;
    if cleaned != term.split_whitespace().collect::<Vec<_>>().join(" ") {
        return Err(LookupError::InexactTerm(term.trim().to_string()));
    }
    Ok(cleaned)
}

/// Sanitized, upper-cased country code or prefix (`us` → `US`)
pub fn sanitize_country(code: &str) -> Result<String, LookupError> {
    sanitize_term(code)
        .map(|code| code.to_uppercase())
        .map_err(|_| LookupError::InvalidCountry(code.trim().to_string()))
}

/// Requested limit or the default, clamped into `1..=MAX_SEARCH_LIMIT`
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT)
}

/// Escape `LIKE` wildcards in an already sanitized term
pub(crate) fn escape_like(term: &str) -> String {
    term.replace('%', "\\%").replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_or_cidr() {
        assert_eq!(parse_ip_or_cidr("8.8.8.1").unwrap().to_string(), "8.8.8.1/32");
        assert_eq!(parse_ip_or_cidr(" 10.1.2.3 ").unwrap().to_string(), "10.1.2.3/32");
        assert_eq!(parse_ip_or_cidr("10.0.0.0/8").unwrap().to_string(), "10.0.0.0/8");
        assert_eq!(parse_ip_or_cidr("8.8.8.1/24").unwrap().to_string(), "8.8.8.0/24");
        assert_eq!(parse_ip_or_cidr("2001:DB8::1").unwrap().to_string(), "2001:db8::1/128");
        assert_eq!(parse_ip_or_cidr("2001:db8::/32").unwrap().to_string(), "2001:db8::/32");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "8.8.8", "8.8.8.8/33", "example.com", "1.2.3.4; DROP TABLE block", "::g"] {
            assert!(
                matches!(parse_ip_or_cidr(input), Err(LookupError::InvalidAddress(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_sanitize_term() {
        assert_eq!(sanitize_term("GOOGLE").unwrap(), "GOOGLE");
        assert_eq!(sanitize_term("  Deutsche   Telekom ").unwrap(), "Deutsche Telekom");
        assert_eq!(sanitize_term("a'; --").unwrap(), "a --");
        assert_eq!(sanitize_term("ORG_NET-1.0").unwrap(), "ORG_NET-1.0");
        assert_eq!(sanitize_term("São Paulo").unwrap(), "São Paulo");
        assert_eq!(sanitize_term(&"x".repeat(500)).unwrap().len(), MAX_TERM_LENGTH);
    }

    #[test]
    fn test_sanitize_term_too_short() {
        for input in ["", "a", "%%%", " ;' "] {
            assert!(matches!(
                sanitize_term(input),
                Err(LookupError::TermTooShort { min: MIN_TERM_LENGTH })
            ));
        }
    }

    #[test]
    fn test_exact_term() {
        assert_eq!(exact_term("GOOGLE").unwrap(), "GOOGLE");
        assert_eq!(exact_term(" ORG_NET-1.0 ").unwrap(), "ORG_NET-1.0");
        for input in ["AS+NET", "NET/24", "a'; --"] {
            assert!(
                matches!(exact_term(input), Err(LookupError::InexactTerm(_))),
                "{input} should be rejected"
            );
        }
        assert!(matches!(exact_term(&"x".repeat(500)), Err(LookupError::InexactTerm(_))));
        assert!(matches!(exact_term("%"), Err(LookupError::TermTooShort { .. })));
    }

    #[test]
    fn test_sanitize_country() {
        assert_eq!(sanitize_country("us").unwrap(), "US");
        assert!(matches!(sanitize_country("!"), Err(LookupError::InvalidCountry(_))));
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_SEARCH_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(10_000)), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ORG_NET"), "ORG\\_NET");
        assert_eq!(escape_like("plain"), "plain");
    }
}
