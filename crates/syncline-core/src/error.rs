//! Error types for Syncline

use thiserror::Error;

/// Core Syncline errors
///
/// Recording-path problems (missing reference clock, empty polls) are not
/// errors: they degrade to fallback provenance or `None`. Only the analysis
/// path and persistence surface errors.
#[derive(Error, Debug)]
pub enum SyncError {
    // Timeline errors
    #[error("No anchor event of type `{anchor_type}` in record")]
    AnchorNotFound { anchor_type: String },

    #[error("Ambiguous anchor: {count} events of type `{anchor_type}` in record")]
    AmbiguousAnchor { anchor_type: String, count: usize },

    // Record errors
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    // Source errors
    #[error("Stream `{stream}` failed: {reason}")]
    SourceFailed { stream: String, reason: String },

    // Persistence errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Anchor problems only affect alignment, never the recording itself
    pub fn is_anchor_error(&self) -> bool {
        matches!(
            self,
            SyncError::AnchorNotFound { .. } | SyncError::AmbiguousAnchor { .. }
        )
    }
}

/// Result type for Syncline operations
pub type SyncResult<T> = Result<T, SyncError>;
