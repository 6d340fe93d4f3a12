//! Drawing surface capability.
//!
//! The annotator never touches pixels itself. It issues a short list of
//! canvas-style calls against a [`RenderSurface`] supplied by the host: a
//! tiny-skia pixmap on desktop, a JS canvas in the browser, or a
//! [`RecordingSurface`] in tests.

use serde::{Deserialize, Serialize};

use crate::{ImageSource, Rect, Size, ViewportTransform};

/// Opaque white, used as the export backdrop.
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// A drawing target provided by the host.
pub trait RenderSurface {
    /// Logical size of the surface.
    fn size(&self) -> Size;

    /// Clear every pixel to transparent.
    fn clear(&mut self);

    /// Fill the whole surface with an RGBA colour, ignoring the transform.
    fn fill(&mut self, color: [u8; 4]);

    /// Apply the viewport's scale and translation to subsequent draws.
    fn set_transform(&mut self, viewport: &ViewportTransform);

    /// Return to the identity transform.
    fn reset_transform(&mut self);

    /// Draw `image` stretched into `dest`.
    ///
    /// Images the surface cannot resolve are skipped silently.
    fn draw_image(&mut self, image: &ImageSource, dest: Rect);
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// [`RenderSurface::clear`].
    Clear,
    /// [`RenderSurface::fill`].
    Fill {
        /// RGBA colour.
        color: [u8; 4],
    },
    /// [`RenderSurface::set_transform`].
    SetTransform {
        /// Zoom factor.
        scale: f32,
        /// Horizontal offset.
        translate_x: f32,
        /// Vertical offset.
        translate_y: f32,
    },
    /// [`RenderSurface::reset_transform`].
    ResetTransform,
    /// [`RenderSurface::draw_image`].
    DrawImage {
        /// Image source.
        src: ImageSource,
        /// Destination rectangle.
        dest: Rect,
    },
}

/// Surface that records calls instead of drawing.
///
/// Used by the WASM host (commands are replayed onto a JS canvas) and by tests.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    /// Create a recorder reporting the given size.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    /// Recorded commands, oldest first.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the recorder empty.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Destination rectangles of every drawn image, in draw order.
    #[must_use]
    pub fn drawn_images(&self) -> Vec<(&ImageSource, Rect)> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::DrawImage { src, dest } => Some((src, *dest)),
                _ => None,
            })
            .collect()
    }
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn fill(&mut self, color: [u8; 4]) {
        self.commands.push(DrawCommand::Fill { color });
    }

    fn set_transform(&mut self, viewport: &ViewportTransform) {
        self.commands.push(DrawCommand::SetTransform {
            scale: viewport.scale(),
            translate_x: viewport.translate_x,
            translate_y: viewport.translate_y,
        });
    }

    fn reset_transform(&mut self) {
        self.commands.push(DrawCommand::ResetTransform);
    }

    fn draw_image(&mut self, image: &ImageSource, dest: Rect) {
        self.commands.push(DrawCommand::DrawImage {
            src: image.clone(),
            dest,
        });
    }
}
