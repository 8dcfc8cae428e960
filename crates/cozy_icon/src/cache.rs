use std::sync::Arc;

use indexmap::IndexMap;

use crate::{BadgeKind, IconError, IconRenderer, RenderedIcon};

/// Memoizes renders by `(kind, label)`.
/// Markers on a map repeat the same handful of counts and prices, so this saves most of the raster work.
/// Entries are kept in least recently used order and the oldest is evicted once `capacity` is reached.
/// A capacity of `0` disables caching.
#[derive(Debug)]
pub struct IconCache {
    renderer: IconRenderer,
    capacity: usize,
    entries: IndexMap<(BadgeKind, String), Arc<RenderedIcon>>,
    hits: u64,
    misses: u64,
}

impl IconCache {
    pub const DEFAULT_CAPACITY: usize = 256;

    pub fn new(renderer: IconRenderer, capacity: usize) -> Self {
        Self {
            renderer,
            capacity,
            entries: IndexMap::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn renderer(&self) -> &IconRenderer {
        &self.renderer
    }

    pub fn get_or_render(
        &mut self,
        kind: BadgeKind,
        label: &str,
    ) -> Result<Arc<RenderedIcon>, IconError> {
        let key = (kind, label.to_owned());
        if let Some(icon) = self.entries.shift_remove(&key) {
            self.hits += 1;
            self.entries.insert(key, icon.clone());
            return Ok(icon);
        }
        self.misses += 1;
        let icon = Arc::new(self.renderer.render(kind, label)?);
        if self.capacity == 0 {
            return Ok(icon);
        }
        if self.entries.len() >= self.capacity {
            self.entries.shift_remove_index(0);
        }
        self.entries.insert(key, icon.clone());
        Ok(icon)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
