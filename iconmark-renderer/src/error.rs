//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// GPU initialization failed.
    #[error("GPU initialization failed: {0}")]
    GpuInit(String),

    /// Surface/swapchain error.
    #[error("Surface error: {0}")]
    Surface(String),

    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// A pixmap of the requested size could not be allocated.
    #[error("Invalid pixmap size {width}x{height}")]
    PixmapSize {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Export encoding failed.
    #[error("Export failed: {0}")]
    Export(String),
}
