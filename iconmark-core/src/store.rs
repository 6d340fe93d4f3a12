//! Ordered storage of placed icons.
//!
//! Insertion order is z-order: later icons are drawn on top and are hit first.

use crate::{ImageSource, PersistedIconRecord, PlacedIcon, Point, ViewportTransform};

/// The icons placed on the canvas, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconStore {
    icons: Vec<PlacedIcon>,
}

impl IconStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an icon at image-space `(x, y)`.
    pub fn place(&mut self, x: f32, y: f32, size: f32, image: ImageSource) {
        tracing::debug!("Place icon {image} at ({x}, {y}) size {size}");
        self.icons.push(PlacedIcon::new(x, y, size, image));
    }

    /// Remove the top-most icon whose on-screen box contains `screen`.
    ///
    /// Boxes are computed under the *current* `viewport`, so removal keeps
    /// working after pans and zooms. At most one icon is removed.
    pub fn remove_at(&mut self, screen: Point, viewport: &ViewportTransform) -> Option<PlacedIcon> {
        let index = self.hit_test(screen, viewport)?;
        let removed = self.icons.remove(index);
        tracing::debug!(
            "Removed icon {} at ({}, {})",
            removed.image,
            removed.x,
            removed.y
        );
        Some(removed)
    }

    /// Index of the top-most icon under `screen`, if any.
    #[must_use]
    pub fn hit_test(&self, screen: Point, viewport: &ViewportTransform) -> Option<usize> {
        self.icons
            .iter()
            .rposition(|icon| icon.screen_bounds(viewport).contains(screen))
    }

    /// Replace every icon with the given records, preserving their order.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = PersistedIconRecord>) {
        self.icons = records.into_iter().map(PlacedIcon::from).collect();
    }

    /// Wire form of every icon, in z-order.
    #[must_use]
    pub fn to_records(&self) -> Vec<PersistedIconRecord> {
        self.icons.iter().map(PersistedIconRecord::from).collect()
    }

    /// Remove every icon.
    pub fn clear(&mut self) {
        self.icons.clear();
    }

    /// Icons in z-order (bottom first).
    pub fn iter(&self) -> impl Iterator<Item = &PlacedIcon> {
        self.icons.iter()
    }

    /// Icons as a slice, bottom first.
    #[must_use]
    pub fn as_slice(&self) -> &[PlacedIcon] {
        &self.icons
    }

    /// Number of placed icons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    /// Whether no icon has been placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

impl<'a> IntoIterator for &'a IconStore {
    type Item = &'a PlacedIcon;
    type IntoIter = std::slice::Iter<'a, PlacedIcon>;

    fn into_iter(self) -> Self::IntoIter {
        self.icons.iter()
    }
}
