//! Error types shared across netinfo crates

use thiserror::Error;

/// Main error type for netinfo
#[derive(Error, Debug)]
pub enum NetinfoError {
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = NetinfoError::Parse("unknown registry 'iana'".to_string());
        assert_eq!(err.to_string(), "Parse error: unknown registry 'iana'");
    }
}
