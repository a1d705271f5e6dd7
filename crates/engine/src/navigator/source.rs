//! Where a navigator's items come from.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use keynav_types::ElementId;

use crate::document::Document;
use crate::selector::Selector;

/// Default lifetime of a cached live query.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(5_000);

/// Result of the last live query.
#[derive(Debug, Clone)]
pub struct ItemCache {
    items: Vec<ElementId>,
    refreshed_at: Instant,
}

/// Item strategy: a snapshot taken once, or a query re-run against the
/// document when its cached result has expired.
#[derive(Debug, Clone)]
pub enum ItemSource {
    Static {
        initial: Vec<ElementId>,
        items: Vec<ElementId>,
    },
    Live {
        container: ElementId,
        selector: Selector,
        ttl: Duration,
        cache: Option<ItemCache>,
        removed: HashSet<ElementId>,
    },
}

impl ItemSource {
    pub fn snapshot(items: Vec<ElementId>) -> Self {
        ItemSource::Static {
            initial: items.clone(),
            items,
        }
    }

    pub fn live(container: ElementId, selector: Selector, ttl: Duration) -> Self {
        ItemSource::Live {
            container,
            selector,
            ttl,
            cache: None,
            removed: HashSet::new(),
        }
    }

    pub fn container(&self) -> Option<ElementId> {
        match self {
            ItemSource::Static { .. } => None,
            ItemSource::Live { container, .. } => Some(*container),
        }
    }

    /// Items as seen at `now`. A live source re-queries when it has no cache
    /// or the cache is older than its TTL; a zero TTL queries every time.
    pub fn items_at(&mut self, doc: &dyn Document, now: Instant) -> Vec<ElementId> {
        match self {
            ItemSource::Static { items, .. } => items.clone(),
            ItemSource::Live {
                container,
                selector,
                ttl,
                cache,
                removed,
            } => {
                let fresh = cache
                    .as_ref()
                    .is_some_and(|c| !ttl.is_zero() && now.saturating_duration_since(c.refreshed_at) < *ttl);
                if !fresh {
                    *cache = Some(ItemCache {
                        items: doc.query_selector_all(*container, selector),
                        refreshed_at: now,
                    });
                }
                cache
                    .as_ref()
                    .map(|c| c.items.iter().copied().filter(|item| !removed.contains(item)).collect())
                    .unwrap_or_default()
            }
        }
    }

    /// Stops tracking `item`. Returns `false` when it was not tracked.
    pub fn remove(&mut self, doc: &dyn Document, item: ElementId, now: Instant) -> bool {
        if !self.items_at(doc, now).contains(&item) {
            return false;
        }
        match self {
            ItemSource::Static { items, .. } => items.retain(|candidate| *candidate != item),
            ItemSource::Live { removed, .. } => {
                removed.insert(item);
            }
        }
        true
    }

    /// Forgets the cache and every removal.
    pub fn reset(&mut self) {
        match self {
            ItemSource::Static { initial, items } => *items = initial.clone(),
            ItemSource::Live { cache, removed, .. } => {
                *cache = None;
                removed.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocument;

    fn list(doc: &mut MemoryDocument, n: usize) -> (ElementId, Vec<ElementId>) {
        let root = doc.root();
        let ul = doc.append(root, "ul");
        let items = (0..n).map(|_| doc.append_with(ul, "li", &[("data-knw-list-item", "")])).collect();
        (ul, items)
    }

    #[test]
    fn live_source_serves_cache_until_ttl_expires() {
        let mut doc = MemoryDocument::new();
        let (ul, items) = list(&mut doc, 2);
        let mut source = ItemSource::live(ul, Selector::attribute("data-knw-list-item"), Duration::from_secs(5));
        let start = Instant::now();
        assert_eq!(source.items_at(&doc, start), items);

        let late = doc.append_with(ul, "li", &[("data-knw-list-item", "")]);
        assert_eq!(source.items_at(&doc, start + Duration::from_secs(4)).len(), 2);
        let refreshed = source.items_at(&doc, start + Duration::from_secs(5));
        assert_eq!(refreshed.len(), 3);
        assert_eq!(refreshed[2], late);
    }

    #[test]
    fn zero_ttl_disables_the_cache() {
        let mut doc = MemoryDocument::new();
        let (ul, _) = list(&mut doc, 1);
        let mut source = ItemSource::live(ul, Selector::attribute("data-knw-list-item"), Duration::ZERO);
        let now = Instant::now();
        assert_eq!(source.items_at(&doc, now).len(), 1);
        doc.append_with(ul, "li", &[("data-knw-list-item", "")]);
        assert_eq!(source.items_at(&doc, now).len(), 2);
    }

    #[test]
    fn removals_survive_refresh_until_reset() {
        let mut doc = MemoryDocument::new();
        let (ul, items) = list(&mut doc, 3);
        let mut source = ItemSource::live(ul, Selector::attribute("data-knw-list-item"), Duration::ZERO);
        let now = Instant::now();
        assert!(source.remove(&doc, items[1], now));
        assert!(!source.remove(&doc, items[1], now));
        assert_eq!(source.items_at(&doc, now), vec![items[0], items[2]]);
        source.reset();
        assert_eq!(source.items_at(&doc, now), items);
    }

    #[test]
    fn static_source_restores_snapshot_on_reset() {
        let mut doc = MemoryDocument::new();
        let (_, items) = list(&mut doc, 2);
        let mut source = ItemSource::snapshot(items.clone());
        let now = Instant::now();
        assert!(source.remove(&doc, items[0], now));
        assert_eq!(source.items_at(&doc, now), vec![items[1]]);
        source.reset();
        assert_eq!(source.items_at(&doc, now), items);
    }
}
