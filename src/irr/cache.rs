use dashmap::DashMap;
use log::debug;

use crate::irr::irr_traits::IrrCacheTrait;

/// Process-wide read cache of the latest IRR per fund, consumed by external
/// readers (reporting endpoints). Constructed once and injected by
/// reference; the engine only writes through invalidation.
#[derive(Debug, Default)]
pub struct IrrReadCache {
    entries: DashMap<String, f64>,
}

impl IrrReadCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Populated by the read side after it recomputes a view.
    pub fn insert(&self, fund_id: &str, irr_result: f64) {
        self.entries.insert(fund_id.to_string(), irr_result);
    }

    pub fn get(&self, fund_id: &str) -> Option<f64> {
        self.entries.get(fund_id).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IrrCacheTrait for IrrReadCache {
    fn invalidate(&self, fund_ids: &[String]) -> usize {
        let mut removed = 0;
        for fund_id in fund_ids {
            if self.entries.remove(fund_id).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("Invalidated {} cached IRR entries", removed);
        }
        removed
    }

    fn invalidate_all(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_removes_only_named_funds() {
        let cache = IrrReadCache::new();
        cache.insert("f1", 0.05);
        cache.insert("f2", 0.07);

        let removed = cache.invalidate(&["f1".to_string(), "missing".to_string()]);

        assert_eq!(removed, 1);
        assert!(cache.get("f1").is_none());
        assert_eq!(cache.get("f2"), Some(0.07));
    }

    #[test]
    fn invalidate_all_clears_everything() {
        let cache = IrrReadCache::new();
        cache.insert("f1", 0.05);
        cache.insert("f2", 0.07);

        assert_eq!(cache.invalidate_all(), 2);
        assert!(cache.is_empty());
    }
}
