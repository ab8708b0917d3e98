//! Error types for plan splitting

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, SplitError>;

/// Errors that can occur while splitting implementation plans
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("{path} does not exist")]
    MissingInput { path: PathBuf },

    #[error("No '## Tasks' heading found in {path}")]
    StructuralMismatch { path: PathBuf },

    #[error("Storage error on {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Identifier '{identifier}' is not safe to use in a file name")]
    InvalidIdentifier { identifier: String },

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

impl SplitError {
    /// Wrap an io::Error with the path it happened on
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether this error stops the whole run rather than a single document
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingInput { .. } | Self::Pattern(_))
    }
}
