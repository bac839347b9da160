//! Per-document cache of rendered pages
//!
//! Unlike a bounded LRU, entries are never evicted while a document is open.
//! The whole cache is dropped when another document is loaded.

use std::sync::Arc;

use lru::LruCache;

use super::types::RenderedPage;

/// Rendered pages keyed by 1-based page number
pub struct RenderCache {
    pages: LruCache<usize, Arc<RenderedPage>>,
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pages: LruCache::unbounded(),
        }
    }

    /// Get a cached page without touching recency
    #[must_use]
    pub fn get(&self, page: usize) -> Option<Arc<RenderedPage>> {
        self.pages.peek(&page).cloned()
    }

    #[must_use]
    pub fn contains(&self, page: usize) -> bool {
        self.pages.contains(&page)
    }

    /// Insert a page unless one is already present.
    ///
    /// Returns the entry that ends up in the cache and whether it was newly
    /// inserted. A page, once cached, keeps its first image.
    pub fn insert(&mut self, data: Arc<RenderedPage>) -> (Arc<RenderedPage>, bool) {
        if let Some(existing) = self.pages.peek(&data.page) {
            return (existing.clone(), false);
        }
        self.pages.put(data.page, data.clone());
        (data, true)
    }

    /// Sorted list of cached page numbers
    #[must_use]
    pub fn pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.pages.iter().map(|(page, _)| *page).collect();
        pages.sort_unstable();
        pages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, marker: u8) -> Arc<RenderedPage> {
        Arc::new(RenderedPage {
            page: n,
            width: 10,
            height: 10,
            scale_milli: 2000,
            jpeg: vec![marker],
        })
    }

    #[test]
    fn cache_insert_and_get() {
        let mut cache = RenderCache::new();
        let (_, inserted) = cache.insert(page(1, 0));

        assert!(inserted);
        assert!(cache.contains(1));
        assert!(cache.get(1).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn first_write_wins() {
        let mut cache = RenderCache::new();
        cache.insert(page(4, 1));
        let (kept, inserted) = cache.insert(page(4, 2));

        assert!(!inserted);
        assert_eq!(kept.jpeg, vec![1]);
        assert_eq!(cache.get(4).map(|p| p.jpeg.clone()), Some(vec![1]));
    }

    #[test]
    fn cache_grows_without_eviction() {
        let mut cache = RenderCache::new();
        for n in 1..=500 {
            cache.insert(page(n, 0));
        }

        assert_eq!(cache.len(), 500);
        assert!(cache.contains(1));
        assert!(cache.contains(500));
    }

    #[test]
    fn pages_are_listed_in_order() {
        let mut cache = RenderCache::new();
        for n in [5, 2, 9] {
            cache.insert(page(n, 0));
        }
        assert_eq!(cache.pages(), vec![2, 5, 9]);
        assert_eq!(cache.len(), 3);
    }
}
