//! Asynchronous image loading for the desktop host.
//!
//! Image sources are data URIs, `http(s)` URLs or file paths. Relative paths
//! resolve against the loader's base directory.

use std::path::{Path, PathBuf};

use iconmark_core::ImageSource;
use iconmark_renderer::image::{decode_data_uri, decode_image, load_image_file};
use iconmark_renderer::RenderError;
use thiserror::Error;
use tiny_skia::Pixmap;

/// Errors from resolving an image source.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Fetching a remote image failed.
    #[error("fetch failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The remote server answered with a non-success status.
    #[error("fetch returned status {0}")]
    Status(u16),
    /// Reading or decoding failed.
    #[error(transparent)]
    Decode(#[from] RenderError),
    /// The decode task was cancelled or panicked.
    #[error("decode task failed: {0}")]
    Task(String),
}

/// Resolves [`ImageSource`]s to decoded pixmaps.
#[derive(Debug, Clone)]
pub struct ImageLoader {
    http: reqwest::Client,
    base_dir: PathBuf,
}

impl ImageLoader {
    /// Create a loader resolving relative paths against `base_dir`.
    #[must_use]
    pub fn new(http: reqwest::Client, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            base_dir: base_dir.into(),
        }
    }

    /// Path a file source resolves to.
    #[must_use]
    pub fn resolve_path(&self, source: &ImageSource) -> PathBuf {
        let raw = source.as_str();
        let raw = raw.strip_prefix("file://").unwrap_or(raw);
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Load and decode `source`.
    ///
    /// Decoding runs on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be fetched, read or decoded.
    pub async fn load(&self, source: &ImageSource) -> Result<Pixmap, LoadError> {
        if source.is_data_uri() {
            let uri = source.as_str().to_string();
            return Self::decode_blocking(move || decode_data_uri(&uri)).await;
        }

        if source.is_remote() {
            let response = self.http.get(source.as_str()).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(LoadError::Status(status.as_u16()));
            }
            let bytes = response.bytes().await?;
            return Self::decode_blocking(move || decode_image(&bytes)).await;
        }

        let path = self.resolve_path(source);
        Self::decode_blocking(move || load_image_file(&path)).await
    }

    async fn decode_blocking<F>(decode: F) -> Result<Pixmap, LoadError>
    where
        F: FnOnce() -> Result<Pixmap, RenderError> + Send + 'static,
    {
        tokio::task::spawn_blocking(decode)
            .await
            .map_err(|e| LoadError::Task(e.to_string()))?
            .map_err(LoadError::from)
    }
}
