//! Input events for annotator interaction.
//!
//! Coordinates are canvas-relative screen pixels: hosts subtract the canvas
//! origin before building an event.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{ImageSource, Point, Size};

/// Keys the annotator reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key", content = "name", rename_all = "snake_case")]
pub enum Key {
    /// Modifier that arms removal while held (Shift).
    RemoveModifier,
    /// Cancels annotation (Escape).
    Cancel,
    /// Anything else; ignored by the annotator.
    Other(String),
}

/// All input events the annotator can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InputEvent {
    /// Primary pointer button pressed.
    PointerDown {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },

    /// Pointer moved.
    PointerMove {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },

    /// Primary pointer button released.
    PointerUp,

    /// Click (press and release) on the canvas.
    Click {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
    },

    /// Wheel scroll; negative `delta_y` zooms in.
    Wheel {
        /// X coordinate.
        x: f32,
        /// Y coordinate.
        y: f32,
        /// Vertical scroll delta.
        delta_y: f32,
    },

    /// Key pressed.
    KeyDown(Key),

    /// Key released.
    KeyUp(Key),

    /// Icon chosen from the palette.
    SelectIcon(ImageSource),

    /// Grow the icon size by one step.
    IncreaseIconSize,

    /// Shrink the icon size by one step.
    DecreaseIconSize,

    /// Set the icon size directly.
    SetIconSize(f32),

    /// Space available to the canvas changed.
    Resize(Size),
}

impl InputEvent {
    /// Pointer position carried by the event, if any.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        match *self {
            Self::PointerDown { x, y }
            | Self::PointerMove { x, y }
            | Self::Click { x, y }
            | Self::Wheel { x, y, .. } => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// A host-provided stream of input events.
pub trait InputSource {
    /// Next pending event, or `None` when the source is drained.
    fn poll_event(&mut self) -> Option<InputEvent>;
}

/// Simple FIFO input source for hosts that queue events and for tests.
#[derive(Debug, Clone, Default)]
pub struct QueuedInput {
    events: VecDeque<InputEvent>,
}

impl QueuedInput {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event.
    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl FromIterator<InputEvent> for QueuedInput {
    fn from_iter<T: IntoIterator<Item = InputEvent>>(iter: T) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}

impl InputSource for QueuedInput {
    fn poll_event(&mut self) -> Option<InputEvent> {
        self.events.pop_front()
    }
}
