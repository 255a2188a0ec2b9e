//! Defines the custom error type for the `core` module.

use serde::Serialize;
use std::path::{PathBuf, StripPrefixError};
use thiserror::Error;

use super::selection::NodeId;

/// The primary error type for the `core` module.
///
/// This enum encapsulates all possible errors that can occur during
/// tree building, materialization and digest assembly.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// An exclusion pattern that is not a valid regular expression.
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// Represents a failure to strip a path prefix.
    #[error("Failed to strip prefix from path: {0}")]
    PathStrip(#[from] StripPrefixError),

    /// A node id that does not belong to the current selection tree.
    #[error("Unknown tree node: {0}")]
    UnknownNode(NodeId),

    /// The digest generator failed. The message is kept verbatim.
    #[error("{0}")]
    Ingest(String),
}

/// Coarse classification of errors, used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    Configuration,
    Filesystem,
    Ingest,
    Input,
}

impl CoreError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::InvalidPattern { .. } => ErrorCategory::Configuration,
            CoreError::Io(..) | CoreError::NotADirectory(_) | CoreError::PathStrip(_) => {
                ErrorCategory::Filesystem
            }
            CoreError::UnknownNode(_) => ErrorCategory::Input,
            CoreError::Ingest(_) => ErrorCategory::Ingest,
        }
    }

    /// Helper for the common `map_err(|e| CoreError::io(e, path))` pattern.
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        CoreError::Io(source, path.into())
    }
}
