//! Error types for s3sum-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for s3sum-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for s3sum-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Local filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Object or bucket does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store's integrity token could not be turned into a digest
    #[error("Malformed metadata: {0}")]
    MalformedMetadata(String),

    /// Network or store failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store confirmed a fingerprint that differs from what was sent
    #[error("Verification mismatch: expected {expected}, store reported {actual}")]
    VerificationMismatch { expected: String, actual: String },

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the exit code used by verbs without change detection
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::Config(_) => 2, // UsageError
            Error::Transport(_) => 3,                      // NetworkError
            Error::Auth(_) => 4,                           // AuthError
            Error::NotFound(_) => 5,                       // NotFound
            _ => 1,                                        // GeneralError
        }
    }

    /// Whether this error is the expected "object does not exist" signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Transport("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::MalformedMetadata("\"".into()).exit_code(), 1);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidPath("/bad/path".into());
        assert_eq!(err.to_string(), "Invalid path: /bad/path");

        let err = Error::VerificationMismatch {
            expected: "abc".into(),
            actual: "def".into(),
        };
        assert_eq!(
            err.to_string(),
            "Verification mismatch: expected abc, store reported def"
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("bucket/key".into()).is_not_found());
        assert!(!Error::MalformedMetadata("x".into()).is_not_found());
        assert!(!Error::Transport("reset".into()).is_not_found());
    }
}
