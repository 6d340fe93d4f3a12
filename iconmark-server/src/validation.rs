//! Input validation for untrusted data.
//!
//! Everything arriving over HTTP is checked here before it reaches the
//! session store.

use iconmark_core::PersistedIconRecord;
use thiserror::Error;

/// Maximum length for session IDs.
pub const MAX_SESSION_ID_LEN: usize = 64;
/// Maximum icons accepted in a single save.
pub const MAX_ICONS_PER_SESSION: usize = 10_000;
/// Smallest accepted icon size. There is no ceiling, matching the client.
pub const MIN_ICON_SIZE: f64 = 10.0;
/// Maximum length of an icon image source (data URIs included).
pub const MAX_IMAGE_SOURCE_LEN: usize = 1_048_576; // 1MB

/// Validation error types.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Session ID exceeds maximum length.
    #[error("session_id too long (max {MAX_SESSION_ID_LEN} chars)")]
    SessionIdTooLong,
    /// Session ID is empty or contains invalid characters.
    #[error("session_id contains invalid characters")]
    SessionIdInvalidChars,
    /// Too many icons in one save.
    #[error("too many icons: {count} (max {MAX_ICONS_PER_SESSION})")]
    TooManyIcons {
        /// Number submitted.
        count: usize,
    },
    /// An icon position is NaN or infinite.
    #[error("icon {index}: coordinates must be finite")]
    NonFiniteCoordinate {
        /// Position in the submitted list.
        index: usize,
    },
    /// An icon size is below the floor or not a finite number.
    #[error("icon {index}: size {size} must be a finite number >= {MIN_ICON_SIZE}")]
    InvalidIconSize {
        /// Position in the submitted list.
        index: usize,
        /// Submitted size.
        size: f64,
    },
    /// An icon has no image source.
    #[error("icon {index}: imgSrc is empty")]
    EmptyImageSource {
        /// Position in the submitted list.
        index: usize,
    },
    /// An icon image source is too long.
    #[error("icon {index}: imgSrc too long (max {MAX_IMAGE_SOURCE_LEN} bytes)")]
    ImageSourceTooLarge {
        /// Position in the submitted list.
        index: usize,
    },
}

impl ValidationError {
    /// Short label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionIdTooLong | Self::SessionIdInvalidChars => "session_id",
            Self::TooManyIcons { .. } => "icon_count",
            Self::NonFiniteCoordinate { .. } => "coordinate",
            Self::InvalidIconSize { .. } => "icon_size",
            Self::EmptyImageSource { .. } | Self::ImageSourceTooLarge { .. } => "image_source",
        }
    }
}

/// Check if a character is valid for IDs (ASCII alphanumeric, hyphen, or underscore).
fn is_valid_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validate a session ID.
///
/// Valid session IDs:
/// - 1-64 characters
/// - ASCII alphanumeric, hyphen, underscore only
///
/// # Errors
///
/// Returns [`ValidationError::SessionIdTooLong`] if the ID exceeds 64 characters.
/// Returns [`ValidationError::SessionIdInvalidChars`] if the ID is empty or contains invalid characters.
pub fn validate_session_id(id: &str) -> Result<(), ValidationError> {
    if id.len() > MAX_SESSION_ID_LEN {
        return Err(ValidationError::SessionIdTooLong);
    }
    if id.is_empty() || !id.chars().all(is_valid_id_char) {
        return Err(ValidationError::SessionIdInvalidChars);
    }
    Ok(())
}

/// Validate a single icon record.
///
/// # Errors
///
/// Returns the first rule the record breaks.
pub fn validate_record(index: usize, record: &PersistedIconRecord) -> Result<(), ValidationError> {
    if !record.x.is_finite() || !record.y.is_finite() {
        return Err(ValidationError::NonFiniteCoordinate { index });
    }
    if !record.size.is_finite() || record.size < MIN_ICON_SIZE {
        return Err(ValidationError::InvalidIconSize {
            index,
            size: record.size,
        });
    }
    if record.img_src.is_empty() {
        return Err(ValidationError::EmptyImageSource { index });
    }
    if record.img_src.len() > MAX_IMAGE_SOURCE_LEN {
        return Err(ValidationError::ImageSourceTooLarge { index });
    }
    Ok(())
}

/// Validate a full save request.
///
/// An empty list is valid: it saves a session with no icons.
///
/// # Errors
///
/// Returns [`ValidationError::TooManyIcons`] or the first invalid record.
pub fn validate_records(records: &[PersistedIconRecord]) -> Result<(), ValidationError> {
    if records.len() > MAX_ICONS_PER_SESSION {
        return Err(ValidationError::TooManyIcons {
            count: records.len(),
        });
    }
    records
        .iter()
        .enumerate()
        .try_for_each(|(index, record)| validate_record(index, record))
}
