//! # Store Error Types
//!
//! Errors for ledger and configuration file access.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / toml errors / bad ledger line                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds path and line context                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  anyhow::Error (in the divvy binary) ← printed to the terminal          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A ledger line is not `name,amount`.
    ///
    /// ## When This Occurs
    /// - The file was edited by hand
    /// - A name containing a comma was written by an older version
    #[error("Corrupt shopper ledger at line {line}: {reason}")]
    CorruptLedger { line: usize, reason: String },

    /// Invalid configuration values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// No platform directory could be determined and no path was given.
    #[error("No {0} path available")]
    NoPath(&'static str),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> StoreError {
        let path = path.into();
        move |source| StoreError::Io { path, source }
    }
}

impl From<toml::de::Error> for StoreError {
    fn from(err: toml::de::Error) -> Self {
        StoreError::ConfigLoadFailed(err.to_string())
    }
}

impl From<divvy_core::ValidationError> for StoreError {
    fn from(err: divvy_core::ValidationError) -> Self {
        StoreError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::CorruptLedger {
            line: 3,
            reason: "missing amount".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Corrupt shopper ledger at line 3: missing amount"
        );
    }

    #[test]
    fn test_io_error_carries_path() {
        let err = StoreError::io("/tmp/shoppers.txt")(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(err.to_string().starts_with("I/O error on /tmp/shoppers.txt"));
    }
}
