//! Interaction mode state machine.
//!
//! Annotating and removing are sticky modes toggled by palette selection and
//! the removal modifier. Panning is transient: it only exists between a
//! pointer-down and the following pointer-up, and cannot start while either
//! sticky mode is active.

use serde::{Deserialize, Serialize};

use crate::viewport::PanAnchor;
use crate::ImageSource;

/// Coarse mode reported to hosts (cursor shape, status bar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Nothing armed.
    Idle,
    /// Dragging the view.
    Panning,
    /// An icon is selected and follows the pointer.
    Annotating,
    /// The removal modifier is held.
    Removing,
}

/// Icon image that follows the pointer while annotating.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverPreview {
    /// Image of the selected palette icon.
    pub image: ImageSource,
}

/// Mode flags plus the transient pan anchor.
#[derive(Debug, Clone, Default)]
pub struct ModeState {
    removing: bool,
    preview: Option<HoverPreview>,
    pan: Option<PanAnchor>,
}

impl ModeState {
    /// Fresh idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reported mode. Removal wins over annotation, which wins over panning.
    #[must_use]
    pub fn mode(&self) -> InteractionMode {
        if self.removing {
            InteractionMode::Removing
        } else if self.preview.is_some() {
            InteractionMode::Annotating
        } else if self.pan.is_some() {
            InteractionMode::Panning
        } else {
            InteractionMode::Idle
        }
    }

    /// Whether the removal modifier is held.
    #[must_use]
    pub fn is_removing(&self) -> bool {
        self.removing
    }

    /// Whether an icon is selected for placement.
    #[must_use]
    pub fn is_annotating(&self) -> bool {
        self.preview.is_some()
    }

    /// Whether a pan drag is in progress.
    #[must_use]
    pub fn is_panning(&self) -> bool {
        self.pan.is_some()
    }

    /// Current hover preview, present only while annotating.
    #[must_use]
    pub fn preview(&self) -> Option<&HoverPreview> {
        self.preview.as_ref()
    }

    /// Active pan anchor.
    #[must_use]
    pub fn pan_anchor(&self) -> Option<PanAnchor> {
        self.pan
    }

    /// Arm or disarm removal.
    pub fn set_removing(&mut self, removing: bool) {
        if self.removing != removing {
            tracing::debug!("Removing mode {}", if removing { "on" } else { "off" });
        }
        self.removing = removing;
    }

    /// Select a palette icon: start annotating, drop removal.
    pub fn select_icon(&mut self, image: ImageSource) {
        tracing::debug!("Annotating with {image}");
        self.preview = Some(HoverPreview { image });
        self.removing = false;
    }

    /// Leave annotation mode and discard the preview.
    ///
    /// Returns whether anything changed.
    pub fn cancel(&mut self) -> bool {
        let was = self.preview.take().is_some();
        if was {
            tracing::debug!("Annotation cancelled");
        }
        was
    }

    /// Start a pan if no sticky mode is active.
    ///
    /// Returns whether panning started.
    pub fn try_begin_pan(&mut self, anchor: PanAnchor) -> bool {
        if self.removing || self.preview.is_some() {
            return false;
        }
        self.pan = Some(anchor);
        true
    }

    /// Finish any pan in progress.
    pub fn end_pan(&mut self) {
        self.pan = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Point, ViewportTransform};

    fn anchor() -> PanAnchor {
        ViewportTransform::default().begin_pan(Point::new(0.0, 0.0))
    }

    #[test]
    fn starts_idle() {
        let state = ModeState::new();
        assert_eq!(state.mode(), InteractionMode::Idle);
        assert!(state.preview().is_none());
    }

    #[test]
    fn select_icon_clears_removing() {
        let mut state = ModeState::new();
        state.set_removing(true);
        state.select_icon(ImageSource::new("pin.png"));
        assert!(!state.is_removing());
        assert_eq!(state.mode(), InteractionMode::Annotating);
    }

    #[test]
    fn removing_takes_precedence_while_annotating() {
        let mut state = ModeState::new();
        state.select_icon(ImageSource::new("pin.png"));
        state.set_removing(true);
        assert_eq!(state.mode(), InteractionMode::Removing);
        state.set_removing(false);
        assert_eq!(state.mode(), InteractionMode::Annotating);
    }

    #[test]
    fn pan_suppressed_by_sticky_modes() {
        let mut state = ModeState::new();
        state.set_removing(true);
        assert!(!state.try_begin_pan(anchor()));
        state.set_removing(false);

        state.select_icon(ImageSource::new("pin.png"));
        assert!(!state.try_begin_pan(anchor()));
        assert!(state.cancel());

        assert!(state.try_begin_pan(anchor()));
        assert_eq!(state.mode(), InteractionMode::Panning);
        state.end_pan();
        assert_eq!(state.mode(), InteractionMode::Idle);
    }

    #[test]
    fn cancel_without_selection_reports_no_change() {
        let mut state = ModeState::new();
        assert!(!state.cancel());
    }
}
