//! # iconmark Core
//!
//! Core annotation logic: icon markers placed over a fixed background image
//! on a pannable, zoomable canvas. Compiles to WASM for browser hosts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               iconmark-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Viewport        │  Input Handler           │
//! │  - Pan / zoom    │  - Pointer + key events  │
//! │  - Screen<->img  │  - Mode state machine    │
//! ├─────────────────────────────────────────────┤
//! │  Icon Store      │  Redraw / Export         │
//! │  - Z-ordered     │  - RenderSurface trait   │
//! │  - Hit testing   │  - Viewport independent  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Host resources (drawing surface, input events, window resizes) are
//! injected: see [`RenderSurface`], [`InputSource`] and [`ResizeBus`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod annotator;
pub mod error;
pub mod event;
pub mod geometry;
pub mod icon;
pub mod render;
pub mod resize;
pub mod state;
pub mod store;
pub mod viewport;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use annotator::{Annotator, LoadTicket, Redraw};
pub use error::{AnnotatorError, AnnotatorResult};
pub use event::{InputEvent, InputSource, Key, QueuedInput};
pub use geometry::{Point, Rect, Size};
pub use icon::{IconSize, ImageSource, PersistedIconRecord, PlacedIcon};
pub use render::{DrawCommand, RecordingSurface, RenderSurface};
pub use resize::{ResizeBus, ResizeSubscription};
pub use state::{HoverPreview, InteractionMode, ModeState};
pub use store::IconStore;
pub use viewport::{PanAnchor, ViewportTransform};

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
