//! Translation of winit window events into annotator input.
//!
//! The mapper owns the little host state the annotator never sees: which
//! modifiers are held, where the cursor is, and the icon palette behind the
//! number keys.

use iconmark_core::{ImageSource, InputEvent, Key, Point, Size};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{Key as WinitKey, ModifiersState, NamedKey};

/// Something the host should do in response to a window event.
#[derive(Debug, Clone, PartialEq)]
pub enum HostAction {
    /// Forward to the annotator.
    Input(InputEvent),
    /// Save the current icons.
    Save,
    /// Load icons from the configured or last saved session.
    Load,
    /// Export the annotated image.
    Export,
}

/// Where the logical canvas sits inside the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasLayout {
    /// Physical pixels per logical pixel.
    pub scale_factor: f32,
    /// Canvas top-left in logical window coordinates.
    pub origin: Point,
}

impl Default for CanvasLayout {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            origin: Point::new(0.0, 0.0),
        }
    }
}

impl CanvasLayout {
    /// Logical size of a window.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn container(window: PhysicalSize<u32>, scale_factor: f32) -> Size {
        Size::new(
            window.width as f32 / scale_factor,
            window.height as f32 / scale_factor,
        )
    }

    /// Layout centring `canvas` in `window`.
    #[must_use]
    pub fn centered(window: PhysicalSize<u32>, scale_factor: f32, canvas: Size) -> Self {
        let container = Self::container(window, scale_factor);
        Self {
            scale_factor,
            origin: Point::new(
                ((container.width - canvas.width) / 2.0).max(0.0),
                ((container.height - canvas.height) / 2.0).max(0.0),
            ),
        }
    }

    /// Canvas-relative logical point for a physical cursor position.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_canvas(&self, position: PhysicalPosition<f64>) -> Point {
        let scale = f64::from(self.scale_factor);
        Point::new(
            (position.x / scale) as f32 - self.origin.x,
            (position.y / scale) as f32 - self.origin.y,
        )
    }

    /// Whether a canvas-relative point lies on a canvas of the given size.
    #[must_use]
    pub fn contains(point: Point, canvas: Size) -> bool {
        (0.0..=canvas.width).contains(&point.x) && (0.0..=canvas.height).contains(&point.y)
    }
}

/// Maps winit input to [`HostAction`]s.
#[derive(Debug, Clone, Default)]
pub struct InputMapper {
    palette: Vec<ImageSource>,
    cursor: Point,
    on_canvas: bool,
    modifiers: ModifiersState,
}

impl InputMapper {
    /// Create a mapper with the icons behind keys `1`..`9`.
    #[must_use]
    pub fn new(palette: Vec<ImageSource>) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    /// Icons selectable from the keyboard.
    #[must_use]
    pub fn palette(&self) -> &[ImageSource] {
        &self.palette
    }

    /// Last known cursor position, canvas-relative.
    #[must_use]
    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// Whether the cursor is over the canvas.
    #[must_use]
    pub fn on_canvas(&self) -> bool {
        self.on_canvas
    }

    /// Cursor moved to a canvas-relative point, `on_canvas` telling whether
    /// it is over the canvas or the backdrop around it.
    ///
    /// Moves are forwarded either way so a drag that leaves the canvas keeps
    /// panning.
    pub fn cursor_moved(&mut self, at: Point, on_canvas: bool) -> HostAction {
        self.cursor = at;
        self.on_canvas = on_canvas;
        HostAction::Input(InputEvent::PointerMove { x: at.x, y: at.y })
    }

    /// Mouse button pressed or released.
    ///
    /// A left release yields the pointer-up and, over the canvas, a click at
    /// the cursor. Presses on the backdrop are ignored.
    #[must_use]
    pub fn mouse_button(&self, state: ElementState, button: MouseButton) -> Vec<HostAction> {
        if button != MouseButton::Left {
            return Vec::new();
        }
        let Point { x, y } = self.cursor;
        match state {
            ElementState::Pressed if self.on_canvas => {
                vec![HostAction::Input(InputEvent::PointerDown { x, y })]
            }
            ElementState::Pressed => Vec::new(),
            ElementState::Released if self.on_canvas => vec![
                HostAction::Input(InputEvent::PointerUp),
                HostAction::Input(InputEvent::Click { x, y }),
            ],
            ElementState::Released => vec![HostAction::Input(InputEvent::PointerUp)],
        }
    }

    /// Mouse wheel at the cursor.
    ///
    /// winit reports scrolling up as positive; the annotator zooms in on a
    /// negative delta.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn wheel(&self, delta: MouseScrollDelta) -> Option<HostAction> {
        let delta_y = match delta {
            MouseScrollDelta::LineDelta(_, y) => -y,
            MouseScrollDelta::PixelDelta(p) => -(p.y as f32),
        };
        if !self.on_canvas || !delta_y.is_finite() || delta_y.abs() < f32::EPSILON {
            return None;
        }
        let Point { x, y } = self.cursor;
        Some(HostAction::Input(InputEvent::Wheel { x, y, delta_y }))
    }

    /// Modifier state changed. Shift arms removal while held.
    pub fn modifiers_changed(&mut self, modifiers: ModifiersState) -> Option<HostAction> {
        let was_shift = self.modifiers.shift_key();
        self.modifiers = modifiers;
        match (was_shift, modifiers.shift_key()) {
            (false, true) => Some(HostAction::Input(InputEvent::KeyDown(Key::RemoveModifier))),
            (true, false) => Some(HostAction::Input(InputEvent::KeyUp(Key::RemoveModifier))),
            _ => None,
        }
    }

    /// Logical key pressed or released.
    #[must_use]
    pub fn key(&self, key: &WinitKey, state: ElementState) -> Option<HostAction> {
        if state != ElementState::Pressed {
            return None;
        }
        match key {
            WinitKey::Named(NamedKey::Escape) => {
                Some(HostAction::Input(InputEvent::KeyDown(Key::Cancel)))
            }
            WinitKey::Character(text) => self.character(text.as_str()),
            _ => None,
        }
    }

    fn character(&self, text: &str) -> Option<HostAction> {
        let command = self.modifiers.control_key() || self.modifiers.super_key();
        if command {
            return match text.to_ascii_lowercase().as_str() {
                "s" => Some(HostAction::Save),
                "l" => Some(HostAction::Load),
                "e" => Some(HostAction::Export),
                _ => None,
            };
        }
        match text {
            "+" | "=" => Some(HostAction::Input(InputEvent::IncreaseIconSize)),
            "-" | "_" => Some(HostAction::Input(InputEvent::DecreaseIconSize)),
            digit => {
                let index = digit.parse::<usize>().ok()?.checked_sub(1)?;
                self.palette
                    .get(index)
                    .map(|image| HostAction::Input(InputEvent::SelectIcon(image.clone())))
            }
        }
    }
}
