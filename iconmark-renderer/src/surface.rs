//! tiny-skia implementation of [`RenderSurface`].

use iconmark_core::{ImageSource, Rect, RenderSurface, Size, ViewportTransform};
use tiny_skia::{Color, FilterQuality, Pixmap, PixmapPaint, Transform};

use crate::cache::ImageCache;
use crate::error::{RenderError, RenderResult};

/// Raster surface backed by an owned [`Pixmap`].
///
/// Images are resolved through a borrowed [`ImageCache`]; anything missing or
/// broken is skipped. A pixel scale maps logical canvas units to pixels.
pub struct PixmapSurface<'c> {
    pixmap: Pixmap,
    images: &'c ImageCache,
    logical: Size,
    base: Transform,
    current: Transform,
}

impl<'c> PixmapSurface<'c> {
    /// Create a surface for a logical `size`, rendered at `pixel_scale`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel size is zero or too large.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(size: Size, pixel_scale: f32, images: &'c ImageCache) -> RenderResult<Self> {
        let width = (size.width * pixel_scale).round().max(0.0) as u32;
        let height = (size.height * pixel_scale).round().max(0.0) as u32;
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::PixmapSize { width, height })?;
        let base = Transform::from_scale(pixel_scale, pixel_scale);
        Ok(Self {
            pixmap,
            images,
            logical: size,
            base,
            current: base,
        })
    }

    /// Rendered pixels.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Consume the surface, returning its pixels.
    #[must_use]
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }
}

impl RenderSurface for PixmapSurface<'_> {
    fn size(&self) -> Size {
        self.logical
    }

    fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    fn fill(&mut self, color: [u8; 4]) {
        self.pixmap
            .fill(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    }

    fn set_transform(&mut self, viewport: &ViewportTransform) {
        let scale = viewport.scale();
        self.current = self.base.pre_concat(Transform::from_row(
            scale,
            0.0,
            0.0,
            scale,
            viewport.translate_x,
            viewport.translate_y,
        ));
    }

    fn reset_transform(&mut self) {
        self.current = self.base;
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_image(&mut self, image: &ImageSource, dest: Rect) {
        let Some(src) = self.images.peek(image) else {
            tracing::trace!("Skipping unresolved image {image}");
            return;
        };
        if dest.width <= 0.0 || dest.height <= 0.0 {
            return;
        }

        let sx = dest.width / src.width() as f32;
        let sy = dest.height / src.height() as f32;
        let placement = Transform::from_row(sx, 0.0, 0.0, sy, dest.x, dest.y);
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            (*src).as_ref(),
            &paint,
            self.current.pre_concat(placement),
            None,
        );
    }
}
