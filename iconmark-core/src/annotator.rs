//! The canvas view controller.
//!
//! [`Annotator`] owns the viewport, the icon store and the interaction mode.
//! Input events mutate that state and report whether a redraw is needed; the
//! host then calls [`Annotator::redraw`] with its surface.

use std::collections::BTreeSet;

use crate::render::WHITE;
use crate::viewport::fit_canvas;
use crate::{
    AnnotatorError, AnnotatorResult, IconSize, IconStore, ImageSource, InputEvent, InputSource,
    InteractionMode, Key, ModeState, PersistedIconRecord, Point, Rect, RenderSurface,
    ResizeSubscription, Size, ViewportTransform,
};

/// Logical canvas width before the first resize.
pub const DEFAULT_CANVAS_WIDTH: f32 = 800.0;

/// Logical canvas height before the first resize.
pub const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;

/// Whether the host should redraw after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Redraw {
    /// Visible state changed.
    Needed,
    /// Nothing visible changed.
    NotNeeded,
}

impl Redraw {
    /// `true` for [`Redraw::Needed`].
    #[must_use]
    pub fn is_needed(self) -> bool {
        self == Self::Needed
    }

    /// Combine two outcomes; a redraw is needed if either needs one.
    pub fn or(self, other: Self) -> Self {
        if self.is_needed() || other.is_needed() {
            Self::Needed
        } else {
            Self::NotNeeded
        }
    }

    fn when(changed: bool) -> Self {
        if changed {
            Self::Needed
        } else {
            Self::NotNeeded
        }
    }
}

/// Token identifying one load request.
///
/// Only the most recently issued ticket may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

impl LoadTicket {
    /// Rebuild a ticket from a generation number handed across an FFI
    /// boundary. A generation that was never issued is refused like a stale
    /// one.
    #[must_use]
    pub fn from_generation(generation: u64) -> Self {
        Self(generation)
    }

    /// Raw generation number.
    #[must_use]
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Interactive icon annotator over a background image.
#[derive(Debug)]
pub struct Annotator {
    viewport: ViewportTransform,
    store: IconStore,
    mode: ModeState,
    pointer: Point,
    icon_size: IconSize,
    canvas_size: Size,
    aspect_ratio: f32,
    background: Option<ImageSource>,
    load_generation: u64,
    resize: Option<ResizeSubscription>,
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new(Size::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT))
    }
}

impl Annotator {
    /// Create an annotator with the given logical canvas size.
    ///
    /// The canvas aspect ratio is preserved on later resizes.
    #[must_use]
    pub fn new(canvas_size: Size) -> Self {
        let aspect_ratio = canvas_size
            .aspect_ratio()
            .unwrap_or(DEFAULT_CANVAS_WIDTH / DEFAULT_CANVAS_HEIGHT);
        Self {
            viewport: ViewportTransform::default(),
            store: IconStore::new(),
            mode: ModeState::new(),
            pointer: Point::default(),
            icon_size: IconSize::default(),
            canvas_size,
            aspect_ratio,
            background: None,
            load_generation: 0,
            resize: None,
        }
    }

    /// Set the background image.
    #[must_use]
    pub fn with_background(mut self, background: ImageSource) -> Self {
        self.background = Some(background);
        self
    }

    /// Replace the background image.
    pub fn set_background(&mut self, background: ImageSource) -> Redraw {
        self.background = Some(background);
        Redraw::Needed
    }

    /// Adopt the aspect ratio of the decoded background image.
    ///
    /// The logical canvas is reshaped at the same width. Degenerate sizes are
    /// ignored.
    pub fn set_background_size(&mut self, natural: Size) -> Redraw {
        let Some(aspect) = natural.aspect_ratio() else {
            return Redraw::NotNeeded;
        };
        self.aspect_ratio = aspect;
        self.canvas_size = Size::new(self.canvas_size.width, self.canvas_size.width / aspect);
        Redraw::Needed
    }

    /// Current viewport transform.
    #[must_use]
    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    /// Placed icons.
    #[must_use]
    pub fn store(&self) -> &IconStore {
        &self.store
    }

    /// Mode flags.
    #[must_use]
    pub fn mode_state(&self) -> &ModeState {
        &self.mode
    }

    /// Coarse interaction mode.
    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        self.mode.mode()
    }

    /// Size used for the next placed icon.
    #[must_use]
    pub fn icon_size(&self) -> f32 {
        self.icon_size.get()
    }

    /// Last known pointer position (canvas-relative).
    #[must_use]
    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /// Logical canvas size; also the image-space extent of the background.
    #[must_use]
    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    /// Background image, if one was set.
    #[must_use]
    pub fn background(&self) -> Option<&ImageSource> {
        self.background.as_ref()
    }

    /// Every image source a renderer needs for the current state.
    #[must_use]
    pub fn image_sources(&self) -> BTreeSet<ImageSource> {
        let mut sources: BTreeSet<ImageSource> =
            self.store.iter().map(|icon| icon.image.clone()).collect();
        sources.extend(self.background.iter().cloned());
        sources.extend(self.mode.preview().map(|p| p.image.clone()));
        sources
    }

    /// Handle one input event.
    pub fn handle_event(&mut self, event: &InputEvent) -> Redraw {
        match event {
            InputEvent::PointerDown { x, y } => {
                let pointer = Point::new(*x, *y);
                let anchor = self.viewport.begin_pan(pointer);
                if self.mode.try_begin_pan(anchor) {
                    tracing::trace!("Pan started at ({x}, {y})");
                }
                Redraw::NotNeeded
            }
            InputEvent::PointerMove { x, y } => self.pointer_moved(Point::new(*x, *y)),
            InputEvent::PointerUp => {
                self.mode.end_pan();
                Redraw::NotNeeded
            }
            InputEvent::Click { x, y } => self.click(Point::new(*x, *y)),
            InputEvent::Wheel { x, y, delta_y } => {
                self.viewport.zoom_at(Point::new(*x, *y), *delta_y);
                Redraw::Needed
            }
            InputEvent::KeyDown(Key::RemoveModifier) => {
                self.mode.set_removing(true);
                Redraw::NotNeeded
            }
            InputEvent::KeyUp(Key::RemoveModifier) => {
                self.mode.set_removing(false);
                Redraw::NotNeeded
            }
            InputEvent::KeyDown(Key::Cancel) => {
                self.mode.cancel();
                Redraw::Needed
            }
            InputEvent::KeyDown(_) | InputEvent::KeyUp(_) => Redraw::NotNeeded,
            InputEvent::SelectIcon(image) => {
                self.mode.select_icon(image.clone());
                Redraw::Needed
            }
            InputEvent::IncreaseIconSize => {
                self.icon_size.increase();
                Redraw::when(self.mode.is_annotating())
            }
            InputEvent::DecreaseIconSize => {
                self.icon_size.decrease();
                Redraw::when(self.mode.is_annotating())
            }
            InputEvent::SetIconSize(size) => match self.icon_size.set(*size) {
                Ok(()) => Redraw::when(self.mode.is_annotating()),
                Err(e) => {
                    tracing::debug!("Ignoring icon size {size}: {e}");
                    Redraw::NotNeeded
                }
            },
            InputEvent::Resize(container) => self.resize(*container),
        }
    }

    /// Handle every event the source has pending.
    pub fn drain<S: InputSource + ?Sized>(&mut self, source: &mut S) -> Redraw {
        let mut redraw = Redraw::NotNeeded;
        while let Some(event) = source.poll_event() {
            redraw = redraw.or(self.handle_event(&event));
        }
        redraw
    }

    fn pointer_moved(&mut self, pointer: Point) -> Redraw {
        self.pointer = pointer;
        if let Some(anchor) = self.mode.pan_anchor() {
            self.viewport.pan_to(anchor, pointer);
            return Redraw::Needed;
        }
        Redraw::when(self.mode.is_annotating())
    }

    fn click(&mut self, screen: Point) -> Redraw {
        if self.mode.is_removing() {
            return self.remove_at(screen);
        }
        let Some(preview) = self.mode.preview() else {
            return Redraw::NotNeeded;
        };
        let image = preview.image.clone();
        let at = self.viewport.screen_to_image(screen);
        self.place(at.x, at.y, self.icon_size.get(), image)
    }

    /// Place an icon at image-space `(x, y)`.
    pub fn place(&mut self, x: f32, y: f32, size: f32, image: ImageSource) -> Redraw {
        self.store.place(x, y, size, image);
        Redraw::Needed
    }

    /// Remove the top-most icon under a canvas-relative screen point.
    pub fn remove_at(&mut self, screen: Point) -> Redraw {
        Redraw::when(self.store.remove_at(screen, &self.viewport).is_some())
    }

    /// Refit the logical canvas into a new container size.
    pub fn resize(&mut self, container: Size) -> Redraw {
        if container.width <= 0.0 || container.height <= 0.0 {
            return Redraw::NotNeeded;
        }
        self.canvas_size = fit_canvas(container, self.aspect_ratio);
        tracing::debug!(
            "Canvas resized to {:.0}x{:.0} for container {:.0}x{:.0}",
            self.canvas_size.width,
            self.canvas_size.height,
            container.width,
            container.height
        );
        Redraw::Needed
    }

    /// Follow a resize subscription; any previous one is dropped.
    pub fn attach_resize(&mut self, subscription: ResizeSubscription) {
        self.resize = Some(subscription);
    }

    /// Stop following resizes, handing the subscription back.
    pub fn detach_resize(&mut self) -> Option<ResizeSubscription> {
        self.resize.take()
    }

    /// Apply the latest size from the attached resize subscription.
    pub fn poll_resize(&mut self) -> Redraw {
        match self.resize.as_ref().and_then(ResizeSubscription::take_latest) {
            Some(container) => self.resize(container),
            None => Redraw::NotNeeded,
        }
    }

    /// Wire form of the placed icons, for saving.
    #[must_use]
    pub fn records(&self) -> Vec<PersistedIconRecord> {
        self.store.to_records()
    }

    /// Start a load; results carrying older tickets will be refused.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket(self.load_generation)
    }

    /// Replace the placed icons with a load result.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotatorError::StaleLoad`] if a newer load was started after
    /// `ticket` was issued; the store is left untouched.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        records: Vec<PersistedIconRecord>,
    ) -> AnnotatorResult<Redraw> {
        if ticket.0 != self.load_generation {
            return Err(AnnotatorError::StaleLoad {
                ticket: ticket.0,
                latest: self.load_generation,
            });
        }
        tracing::info!("Loaded {} icon(s)", records.len());
        self.store.replace_all(records);
        Ok(Redraw::Needed)
    }

    /// Draw the live view: background under the viewport transform, icons
    /// in screen space, then the hover preview at the pointer.
    pub fn redraw<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        surface.clear();

        surface.set_transform(&self.viewport);
        if let Some(background) = &self.background {
            surface.draw_image(background, self.background_rect());
        }
        surface.reset_transform();

        for icon in &self.store {
            surface.draw_image(&icon.image, icon.screen_bounds(&self.viewport));
        }

        if let Some(preview) = self.mode.preview() {
            let size = self.viewport.scale_length(self.icon_size.get());
            surface.draw_image(&preview.image, Rect::centered_square(self.pointer, size));
        }

        tracing::trace!(
            "Redraw: {} icon(s), scale {:.3}, mode {:?}",
            self.store.len(),
            self.viewport.scale(),
            self.mode()
        );
    }

    /// Draw the export image: white backdrop, background and icons at native
    /// image-space coordinates. The viewport and hover preview are ignored.
    pub fn render_export<S: RenderSurface + ?Sized>(&self, surface: &mut S) {
        surface.reset_transform();
        surface.clear();
        surface.fill(WHITE);
        if let Some(background) = &self.background {
            surface.draw_image(background, self.background_rect());
        }
        for icon in &self.store {
            surface.draw_image(&icon.image, icon.image_bounds());
        }
    }

    fn background_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.canvas_size.width, self.canvas_size.height)
    }
}
