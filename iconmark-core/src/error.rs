//! Error types for annotator operations.

use thiserror::Error;

/// Result type for annotator operations.
pub type AnnotatorResult<T> = Result<T, AnnotatorError>;

/// Errors that can occur in annotator operations.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    /// Icon size below the allowed floor.
    #[error("Icon size {size} is below the minimum of {min}")]
    IconSizeTooSmall {
        /// Requested size.
        size: f32,
        /// Minimum allowed size.
        min: f32,
    },

    /// Icon size is NaN or infinite.
    #[error("Icon size must be a finite number")]
    IconSizeNotFinite,

    /// Record serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A load result arrived for a load that has since been superseded.
    #[error("Stale load result (ticket {ticket}, latest {latest})")]
    StaleLoad {
        /// Ticket carried by the result.
        ticket: u64,
        /// Most recently issued ticket.
        latest: u64,
    },
}
