//! Viewport transform between image space and screen space.
//!
//! `screen = image * scale + translate`, and the inverse
//! `image = (screen - translate) / scale`. Scale is always kept in
//! [`MIN_SCALE`, `MAX_SCALE`].

use serde::{Deserialize, Serialize};

use crate::{Point, Size};

/// Smallest allowed zoom factor.
pub const MIN_SCALE: f32 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_SCALE: f32 = 5.0;

/// Relative scale change applied per wheel notch.
pub const ZOOM_STEP: f32 = 0.1;

/// Share of the container width the canvas may occupy.
pub const CONTAINER_WIDTH_FRACTION: f32 = 0.9;

/// Share of the container height the canvas may occupy.
pub const CONTAINER_HEIGHT_FRACTION: f32 = 0.7;

/// Clamp a scale factor into the allowed range.
///
/// A NaN input collapses to 1.0.
#[must_use]
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() {
        1.0
    } else {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    }
}

/// Scale and translation applied to image content when drawn on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportTransform {
    scale: f32,
    /// Horizontal offset in screen pixels.
    pub translate_x: f32,
    /// Vertical offset in screen pixels.
    pub translate_y: f32,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

/// Offset between the pointer and the translation captured when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanAnchor {
    dx: f32,
    dy: f32,
}

impl ViewportTransform {
    /// Create a transform; `scale` is clamped.
    #[must_use]
    pub fn new(scale: f32, translate_x: f32, translate_y: f32) -> Self {
        Self {
            scale: clamp_scale(scale),
            translate_x,
            translate_y,
        }
    }

    /// Current zoom factor.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Map an image-space point to screen space.
    #[must_use]
    pub fn image_to_screen(&self, p: Point) -> Point {
        Point::new(
            p.x * self.scale + self.translate_x,
            p.y * self.scale + self.translate_y,
        )
    }

    /// Map a screen-space point back to image space.
    #[must_use]
    pub fn screen_to_image(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.translate_x) / self.scale,
            (p.y - self.translate_y) / self.scale,
        )
    }

    /// Convert an image-space length to screen pixels.
    #[must_use]
    pub fn scale_length(&self, length: f32) -> f32 {
        length * self.scale
    }

    /// Capture the drag anchor for a pan starting at `pointer`.
    #[must_use]
    pub fn begin_pan(&self, pointer: Point) -> PanAnchor {
        PanAnchor {
            dx: pointer.x - self.translate_x,
            dy: pointer.y - self.translate_y,
        }
    }

    /// Move the view so the anchored content follows `pointer`.
    pub fn pan_to(&mut self, anchor: PanAnchor, pointer: Point) {
        self.translate_x = pointer.x - anchor.dx;
        self.translate_y = pointer.y - anchor.dy;
    }

    /// Apply one wheel step at `pointer`.
    ///
    /// Negative `delta_y` zooms in by [`ZOOM_STEP`], positive zooms out, zero
    /// leaves the scale alone. The image point under the pointer stays put.
    /// Returns the resulting scale.
    pub fn zoom_at(&mut self, pointer: Point, delta_y: f32) -> f32 {
        let factor = if delta_y < 0.0 {
            1.0 + ZOOM_STEP
        } else if delta_y > 0.0 {
            1.0 - ZOOM_STEP
        } else {
            1.0
        };
        self.zoom_to(self.scale * factor, pointer)
    }

    /// Set an absolute scale (clamped) keeping the image point under `anchor` fixed.
    ///
    /// Returns the resulting scale.
    pub fn zoom_to(&mut self, scale: f32, anchor: Point) -> f32 {
        let old_scale = self.scale;
        let focus = self.screen_to_image(anchor);
        self.scale = clamp_scale(scale);
        let delta = self.scale - old_scale;
        self.translate_x -= focus.x * delta;
        self.translate_y -= focus.y * delta;
        tracing::trace!(
            "zoom {old_scale:.3} -> {:.3} anchored at ({}, {})",
            self.scale,
            anchor.x,
            anchor.y
        );
        self.scale
    }
}

/// Fit a canvas into `container` preserving `aspect_ratio` (width / height).
///
/// The canvas may use [`CONTAINER_WIDTH_FRACTION`] of the container width and
/// [`CONTAINER_HEIGHT_FRACTION`] of its height; whichever bound binds first
/// wins.
#[must_use]
pub fn fit_canvas(container: Size, aspect_ratio: f32) -> Size {
    let max_width = container.width * CONTAINER_WIDTH_FRACTION;
    let max_height = container.height * CONTAINER_HEIGHT_FRACTION;

    if max_width / aspect_ratio <= max_height {
        Size::new(max_width, max_width / aspect_ratio)
    } else {
        Size::new(max_height * aspect_ratio, max_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn identity_maps_points_unchanged() {
        let vp = ViewportTransform::default();
        let p = Point::new(12.5, -3.0);
        assert_eq!(vp.image_to_screen(p), p);
        assert_eq!(vp.screen_to_image(p), p);
    }

    #[test]
    fn constructor_clamps_scale() {
        assert!(approx(ViewportTransform::new(50.0, 0.0, 0.0).scale(), MAX_SCALE));
        assert!(approx(ViewportTransform::new(0.0, 0.0, 0.0).scale(), MIN_SCALE));
        assert!(approx(ViewportTransform::new(f32::NAN, 0.0, 0.0).scale(), 1.0));
    }

    #[test]
    fn pan_follows_pointer_from_anchor() {
        let mut vp = ViewportTransform::new(1.0, 10.0, 20.0);
        let anchor = vp.begin_pan(Point::new(100.0, 100.0));
        vp.pan_to(anchor, Point::new(130.0, 90.0));
        assert!(approx(vp.translate_x, 40.0));
        assert!(approx(vp.translate_y, 10.0));
    }

    #[test]
    fn wheel_direction_controls_zoom() {
        let mut vp = ViewportTransform::default();
        assert!(approx(vp.zoom_at(Point::default(), -1.0), 1.1));
        let mut vp = ViewportTransform::default();
        assert!(approx(vp.zoom_at(Point::default(), 3.0), 0.9));
        let mut vp = ViewportTransform::default();
        assert!(approx(vp.zoom_at(Point::default(), 0.0), 1.0));
    }

    #[test]
    fn zoom_keeps_pointer_anchor_fixed() {
        let mut vp = ViewportTransform::new(1.3, -40.0, 25.0);
        let pointer = Point::new(321.0, 123.0);
        let before = vp.screen_to_image(pointer);
        vp.zoom_at(pointer, -120.0);
        let after = vp.image_to_screen(before);
        assert!(approx(after.x, pointer.x));
        assert!(approx(after.y, pointer.y));
    }

    #[test]
    fn anchored_zoom_to_double_scale() {
        let mut vp = ViewportTransform::default();
        vp.zoom_to(2.0, Point::new(100.0, 100.0));
        assert!(approx(vp.translate_x, -100.0));
        assert!(approx(vp.translate_y, -100.0));
        let p = vp.image_to_screen(Point::new(100.0, 100.0));
        assert!(approx(p.x, 100.0));
        assert!(approx(p.y, 100.0));

        // A 50px icon at the anchor keeps its centre and doubles in size.
        let icon = crate::PlacedIcon::new(100.0, 100.0, 50.0, crate::ImageSource::new("pin.png"));
        let bounds = icon.screen_bounds(&vp);
        assert!(approx(bounds.x, 50.0) && approx(bounds.y, 50.0));
        assert!(approx(bounds.x + bounds.width, 150.0));
        assert!(approx(bounds.y + bounds.height, 150.0));
    }

    #[test]
    fn repeated_wheel_input_never_leaves_range() {
        let mut vp = ViewportTransform::default();
        for _ in 0..200 {
            vp.zoom_at(Point::new(5.0, 5.0), -1.0);
        }
        assert!(approx(vp.scale(), MAX_SCALE));
        for _ in 0..200 {
            vp.zoom_at(Point::new(5.0, 5.0), 1.0);
        }
        assert!(approx(vp.scale(), MIN_SCALE));
    }

    #[test]
    fn fit_canvas_width_bound() {
        // 1000 * 0.9 = 900 wide, 900 / (4/3) = 675 <= 1000 * 0.7
        let size = fit_canvas(Size::new(1000.0, 1000.0), 4.0 / 3.0);
        assert!(approx(size.width, 900.0));
        assert!(approx(size.height, 675.0));
    }

    #[test]
    fn fit_canvas_height_bound() {
        // 2000 * 0.9 = 1800 wide would need 1350 tall > 1000 * 0.7 = 700
        let size = fit_canvas(Size::new(2000.0, 1000.0), 4.0 / 3.0);
        assert!(approx(size.height, 700.0));
        assert!(approx(size.width, 700.0 * 4.0 / 3.0));
    }
}
