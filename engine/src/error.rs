//! Error types for the BoekLog engine.

use thiserror::Error;

/// All possible errors from the BoekLog engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("invalid content encoding: {0}")]
    InvalidEncoding(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::InvalidSnapshot("expected an array".into());
        assert_eq!(err.to_string(), "invalid snapshot: expected an array");

        let err = Error::InvalidEncoding("bad base64".into());
        assert_eq!(err.to_string(), "invalid content encoding: bad base64");
    }
}
