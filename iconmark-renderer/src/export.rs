//! Annotated image export.
//!
//! Renders the background and placed icons at native image coordinates,
//! ignoring the current pan/zoom and hover preview, and encodes the result
//! as PNG or JPEG.

use std::path::Path;

use iconmark_core::Annotator;
use image::ImageEncoder;
use tiny_skia::Pixmap;

use crate::cache::ImageCache;
use crate::error::{RenderError, RenderResult};
use crate::surface::PixmapSurface;

/// Default file name for exported images.
pub const EXPORT_FILE_NAME: &str = "annotated-image.png";

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    Png,
    /// JPEG image.
    Jpeg,
}

impl ExportFormat {
    /// Pick a format from a file extension, defaulting to PNG.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("jpg" | "jpeg") => Self::Jpeg,
            _ => Self::Png,
        }
    }
}

/// Configuration for export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Colour composited under transparent pixels in JPEG output.
    pub background: [u8; 4],
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
    /// Pixels per logical canvas unit (e.g. 2.0 for retina).
    pub scale: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            jpeg_quality: 85,
            scale: 1.0,
        }
    }
}

/// Exports an [`Annotator`]'s content to image bytes.
#[derive(Debug, Clone, Default)]
pub struct IconExporter {
    config: ExportConfig,
}

impl IconExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Export to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn export(
        &self,
        annotator: &Annotator,
        images: &ImageCache,
        format: ExportFormat,
    ) -> RenderResult<Vec<u8>> {
        match format {
            ExportFormat::Png => self.render_to_png(annotator, images),
            ExportFormat::Jpeg => self.render_to_jpeg(annotator, images),
        }
    }

    /// Export and write to `path`; the format follows the extension.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering, encoding or writing fails.
    pub fn export_to_file(
        &self,
        annotator: &Annotator,
        images: &ImageCache,
        path: &Path,
    ) -> RenderResult<()> {
        let bytes = self.export(annotator, images, ExportFormat::from_path(path))?;
        std::fs::write(path, &bytes)
            .map_err(|e| RenderError::Export(format!("{}: {e}", path.display())))?;
        tracing::info!("Exported {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    /// Rasterize the export image.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas size cannot back a pixmap.
    pub fn render_to_pixmap(
        &self,
        annotator: &Annotator,
        images: &ImageCache,
    ) -> RenderResult<Pixmap> {
        let mut surface = PixmapSurface::new(annotator.canvas_size(), self.config.scale, images)?;
        annotator.render_export(&mut surface);
        Ok(surface.into_pixmap())
    }

    /// Export to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_to_png(&self, annotator: &Annotator, images: &ImageCache) -> RenderResult<Vec<u8>> {
        self.render_to_pixmap(annotator, images)?
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Export to JPEG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(
        &self,
        annotator: &Annotator,
        images: &ImageCache,
    ) -> RenderResult<Vec<u8>> {
        let pixmap = self.render_to_pixmap(annotator, images)?;

        // Pixels are premultiplied, so compositing over the backdrop is
        // `src + bg * (1 - a)`.
        let (width, height) = (pixmap.width(), pixmap.height());
        let bg = &self.config.background;
        let mut rgb_data = Vec::with_capacity((width * height * 3) as usize);
        for pixel in pixmap.data().chunks_exact(4) {
            let inv = 1.0 - f32::from(pixel[3]) / 255.0;
            for c in 0..3 {
                rgb_data.push(f32::from(bg[c]).mul_add(inv, f32::from(pixel[c])).round() as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(&rgb_data, width, height, image::ExtendedColorType::Rgb8)
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }
}
