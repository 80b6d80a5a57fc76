//! Error types for the schema sync core.

use std::path::PathBuf;

/// Errors that can occur while building snapshots or rendering diffs.
///
/// Parse failures are deliberately not represented here: the extractors
/// return `None` for text they cannot make sense of, and callers decide
/// whether to skip the object or abort (see the comparator).
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A dump file could not be read.
    #[error("Failed to read dump file '{path}': {source}")]
    DumpUnreadable {
        /// Path to the dump file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for schema sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
