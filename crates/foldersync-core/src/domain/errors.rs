//! Domain error types
//!
//! Validation failures raised while building sync pairs or parsing
//! policy names. Filesystem errors live in `foldersync-sync`.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Source and replica resolve to overlapping trees
    #[error("Overlapping trees: {source_dir} and {replica_dir}")]
    OverlappingTrees {
        /// The source side of the pair
        source_dir: String,
        /// The replica side of the pair
        replica_dir: String,
    },

    /// Unknown policy or mode name
    #[error("Unknown {kind} '{value}'; valid options: {valid}")]
    UnknownVariant {
        /// What was being parsed (e.g. "compare mode")
        kind: &'static str,
        /// The rejected input
        value: String,
        /// Comma-separated list of accepted values
        valid: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidPath(String::new());
        assert_eq!(err.to_string(), "Invalid path: ");

        let err = DomainError::OverlappingTrees {
            source_dir: "/data".to_string(),
            replica_dir: "/data/backup".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Overlapping trees: /data and /data/backup"
        );

        let err = DomainError::UnknownVariant {
            kind: "failure policy",
            value: "retry".to_string(),
            valid: "abort, continue",
        };
        assert_eq!(
            err.to_string(),
            "Unknown failure policy 'retry'; valid options: abort, continue"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InvalidPath("source path is empty".to_string());
        let err2 = DomainError::InvalidPath("source path is empty".to_string());
        let err3 = DomainError::InvalidPath("replica path is empty".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
