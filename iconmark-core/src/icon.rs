//! Placed icons, their wire form, and the icon-size control.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AnnotatorError, AnnotatorResult, Point, Rect, ViewportTransform};

/// Reference to an image resource by its source string.
///
/// The source is a file path, an `http(s)` URL or a `data:` URI. Renderers
/// resolve it through their own image cache; a source that never decodes is
/// simply never drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageSource(String);

impl ImageSource {
    /// Wrap a source string.
    #[must_use]
    pub fn new(src: impl Into<String>) -> Self {
        Self(src.into())
    }

    /// The raw source string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this source is an inline `data:` URI.
    #[must_use]
    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Whether this source must be fetched over HTTP.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Data URIs can be megabytes long; keep logs readable.
        match self.0.char_indices().nth(48) {
            Some((cut, _)) if self.is_data_uri() => write!(f, "{}...", &self.0[..cut]),
            _ => f.write_str(&self.0),
        }
    }
}

impl From<&str> for ImageSource {
    fn from(src: &str) -> Self {
        Self::new(src)
    }
}

impl From<String> for ImageSource {
    fn from(src: String) -> Self {
        Self(src)
    }
}

/// An icon marker placed on the background, in image-space coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedIcon {
    /// Centre X in image space.
    pub x: f32,
    /// Centre Y in image space.
    pub y: f32,
    /// Edge length in image-space units.
    pub size: f32,
    /// Image drawn for this icon.
    pub image: ImageSource,
}

impl PlacedIcon {
    /// Create a placed icon.
    #[must_use]
    pub fn new(x: f32, y: f32, size: f32, image: ImageSource) -> Self {
        Self { x, y, size, image }
    }

    /// Centre in image space.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Bounding box in image space.
    #[must_use]
    pub fn image_bounds(&self) -> Rect {
        Rect::centered_square(self.center(), self.size)
    }

    /// Bounding box on screen under the given viewport.
    #[must_use]
    pub fn screen_bounds(&self, viewport: &ViewportTransform) -> Rect {
        Rect::centered_square(
            viewport.image_to_screen(self.center()),
            viewport.scale_length(self.size),
        )
    }
}

/// Wire form of a [`PlacedIcon`], as exchanged with the persistence service.
///
/// Numbers are kept at JSON (double) precision so records written by other
/// clients survive a save and load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedIconRecord {
    /// Centre X in image space.
    pub x: f64,
    /// Centre Y in image space.
    pub y: f64,
    /// Edge length.
    pub size: f64,
    /// Image source string.
    #[serde(rename = "imgSrc")]
    pub img_src: String,
}

impl From<&PlacedIcon> for PersistedIconRecord {
    fn from(icon: &PlacedIcon) -> Self {
        Self {
            x: f64::from(icon.x),
            y: f64::from(icon.y),
            size: f64::from(icon.size),
            img_src: icon.image.as_str().to_string(),
        }
    }
}

impl From<PersistedIconRecord> for PlacedIcon {
    #[allow(clippy::cast_possible_truncation)]
    fn from(record: PersistedIconRecord) -> Self {
        Self {
            x: record.x as f32,
            y: record.y as f32,
            size: record.size as f32,
            image: ImageSource(record.img_src),
        }
    }
}

/// Size used for newly placed icons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IconSize(f32);

impl IconSize {
    /// Size a fresh annotator starts with.
    pub const DEFAULT: f32 = 50.0;
    /// Increment/decrement step.
    pub const STEP: f32 = 5.0;
    /// Smallest size accepted.
    pub const MIN: f32 = 10.0;

    /// Create an icon size.
    ///
    /// # Errors
    ///
    /// Returns [`AnnotatorError::IconSizeTooSmall`] below [`IconSize::MIN`] and
    /// [`AnnotatorError::IconSizeNotFinite`] for NaN/infinite input.
    pub fn new(size: f32) -> AnnotatorResult<Self> {
        if !size.is_finite() {
            return Err(AnnotatorError::IconSizeNotFinite);
        }
        if size < Self::MIN {
            return Err(AnnotatorError::IconSizeTooSmall {
                size,
                min: Self::MIN,
            });
        }
        Ok(Self(size))
    }

    /// Current value.
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }

    /// Grow by one step.
    pub fn increase(&mut self) {
        self.0 += Self::STEP;
    }

    /// Shrink by one step, never below the floor.
    pub fn decrease(&mut self) {
        if self.0 > Self::MIN {
            self.0 = (self.0 - Self::STEP).max(Self::MIN);
        }
    }

    /// Set directly; invalid values leave the size unchanged.
    ///
    /// # Errors
    ///
    /// Same as [`IconSize::new`].
    pub fn set(&mut self, size: f32) -> AnnotatorResult<()> {
        *self = Self::new(size)?;
        Ok(())
    }
}

impl Default for IconSize {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}
