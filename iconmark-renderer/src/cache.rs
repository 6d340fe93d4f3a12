//! Decoded image cache.
//!
//! Keyed by [`ImageSource`]. A source that failed to load is remembered as
//! broken so hosts don't refetch it every frame, and so drawing can skip it.

use std::collections::HashMap;
use std::sync::Arc;

use iconmark_core::ImageSource;
use tiny_skia::Pixmap;

/// Cache state of a single source.
#[derive(Debug, Clone)]
enum CacheSlot {
    Ready(Arc<Pixmap>),
    Broken,
}

/// Cache of decoded images.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<ImageSource, CacheSlot>,
}

impl ImageCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a decoded image.
    #[must_use]
    pub fn peek(&self, source: &ImageSource) -> Option<Arc<Pixmap>> {
        match self.entries.get(source) {
            Some(CacheSlot::Ready(pixmap)) => Some(Arc::clone(pixmap)),
            Some(CacheSlot::Broken) | None => None,
        }
    }

    /// Store a decoded image, replacing any previous entry for the source.
    pub fn insert(&mut self, source: ImageSource, pixmap: Pixmap) -> Arc<Pixmap> {
        tracing::debug!(
            "Cached {source} ({}x{}, {} bytes)",
            pixmap.width(),
            pixmap.height(),
            pixmap.data().len()
        );

        let pixmap = Arc::new(pixmap);
        self.entries
            .insert(source, CacheSlot::Ready(Arc::clone(&pixmap)));
        pixmap
    }

    /// Remember that a source failed to load.
    pub fn mark_broken(&mut self, source: ImageSource) {
        self.entries.insert(source, CacheSlot::Broken);
    }

    /// Whether the source is known to be unloadable.
    #[must_use]
    pub fn is_broken(&self, source: &ImageSource) -> bool {
        matches!(self.entries.get(source), Some(CacheSlot::Broken))
    }

    /// Whether the source has been resolved, successfully or not.
    #[must_use]
    pub fn contains(&self, source: &ImageSource) -> bool {
        self.entries.contains_key(source)
    }

    /// Sources from `wanted` that have never been resolved.
    pub fn unresolved<'a, I>(&self, wanted: I) -> Vec<ImageSource>
    where
        I: IntoIterator<Item = &'a ImageSource>,
    {
        wanted
            .into_iter()
            .filter(|s| !self.contains(s))
            .cloned()
            .collect()
    }

    /// Evict every entry whose source is not in `keep`.
    ///
    /// Broken markers are kept so failed sources are not retried.
    pub fn retain_sources<'a, I>(&mut self, keep: I) -> usize
    where
        I: IntoIterator<Item = &'a ImageSource>,
    {
        let keep: std::collections::HashSet<&ImageSource> = keep.into_iter().collect();
        let stale: Vec<ImageSource> = self
            .entries
            .iter()
            .filter(|(source, slot)| matches!(slot, CacheSlot::Ready(_)) && !keep.contains(source))
            .map(|(source, _)| source.clone())
            .collect();
        for source in &stale {
            self.entries.remove(source);
        }
        if !stale.is_empty() {
            tracing::debug!("Evicted {} unused image(s)", stale.len());
        }
        stale.len()
    }

    /// Number of entries, broken markers included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
