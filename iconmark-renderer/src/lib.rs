//! # iconmark Renderer
//!
//! CPU rasterization of the annotator's draw calls with tiny-skia, plus
//! PNG/JPEG export and (with the `gpu` feature) presentation of finished
//! frames on a winit window through wgpu.
//!
//! ```text
//! ┌──────────────┐   RenderSurface   ┌───────────────┐   blit   ┌─────────┐
//! │  Annotator   │ ────────────────▶ │ PixmapSurface │ ───────▶ │ Window  │
//! └──────────────┘                   └───────────────┘          └─────────┘
//!                                            ▲
//!                                       ImageCache
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod export;
pub mod image;
#[cfg(feature = "gpu")]
pub mod present;
pub mod surface;

pub use cache::ImageCache;
pub use error::{RenderError, RenderResult};
pub use export::{ExportConfig, ExportFormat, IconExporter, EXPORT_FILE_NAME};
#[cfg(feature = "gpu")]
pub use present::WgpuPresenter;
pub use surface::PixmapSurface;

use iconmark_core::{Annotator, Point};
use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

/// Configuration for the frame renderer.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Colour of the window area around the canvas (RGBA).
    pub backdrop: [u8; 4],
    /// Physical pixels per logical unit.
    pub scale_factor: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backdrop: [240, 240, 240, 255],
            scale_factor: 1.0,
        }
    }
}

/// Renders complete window frames: backdrop plus the annotator's canvas.
#[derive(Debug, Default)]
pub struct FrameRenderer {
    config: RendererConfig,
    images: ImageCache,
    frame_count: u64,
}

impl FrameRenderer {
    /// Create a renderer with the given configuration.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            images: ImageCache::new(),
            frame_count: 0,
        }
    }

    /// Render one frame of `width`x`height` physical pixels with the canvas
    /// placed at the logical `origin`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pixmap cannot be allocated.
    #[allow(clippy::cast_possible_truncation)]
    pub fn render(
        &mut self,
        annotator: &Annotator,
        width: u32,
        height: u32,
        origin: Point,
    ) -> RenderResult<Pixmap> {
        let mut frame = Pixmap::new(width, height).ok_or(RenderError::PixmapSize { width, height })?;
        let [r, g, b, a] = self.config.backdrop;
        frame.fill(Color::from_rgba8(r, g, b, a));

        let scale = self.config.scale_factor;
        let mut canvas = PixmapSurface::new(annotator.canvas_size(), scale, &self.images)?;
        annotator.redraw(&mut canvas);

        frame.draw_pixmap(
            (origin.x * scale).round() as i32,
            (origin.y * scale).round() as i32,
            canvas.pixmap().as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );

        self.frame_count += 1;
        Ok(frame)
    }

    /// Number of frames rendered.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Decoded images.
    #[must_use]
    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// Mutable access to decoded images, for hosts delivering loads.
    pub fn images_mut(&mut self) -> &mut ImageCache {
        &mut self.images
    }

    /// Drop decoded images the annotator no longer draws, e.g. after a
    /// load replaced every icon. Returns how many were evicted.
    pub fn evict_unused(&mut self, annotator: &Annotator) -> usize {
        self.images.retain_sources(&annotator.image_sources())
    }

    /// Get the renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Update the physical pixels per logical unit.
    pub fn set_scale_factor(&mut self, scale_factor: f32) {
        if scale_factor.is_finite() && scale_factor > 0.0 {
            self.config.scale_factor = scale_factor;
        }
    }
}
