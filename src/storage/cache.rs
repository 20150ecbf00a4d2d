use crate::report::dataset::SiteDataset;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Thread-safe cache of parsed site datasets with TTL-based expiration.
#[derive(Clone)]
pub struct DatasetCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

struct CacheEntry {
    dataset: Arc<SiteDataset>,
    inserted_at: Instant,
}

impl DatasetCache {
    /// Create a new cache with the given TTL in seconds.
    /// A TTL of 0 disables caching (all lookups miss).
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Look up a dataset by site id. Returns `None` if missing or expired.
    pub fn get(&self, site: &str) -> Option<Arc<SiteDataset>> {
        if self.ttl.is_zero() {
            return None;
        }
        self.entries.lock().get(site).and_then(|entry| {
            if entry.inserted_at.elapsed() > self.ttl {
                None
            } else {
                Some(Arc::clone(&entry.dataset))
            }
        })
    }

    pub fn insert(&self, site: String, dataset: Arc<SiteDataset>) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.lock().insert(
            site,
            CacheEntry {
                dataset,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove expired entries from the cache.
    pub fn cleanup_expired(&self) {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(url: &str) -> Arc<SiteDataset> {
        Arc::new(SiteDataset {
            url: url.to_string(),
            ..SiteDataset::default()
        })
    }

    #[test]
    fn test_cache_insert_and_get() {
        let cache = DatasetCache::new(60);
        cache.insert("a".to_string(), dataset("http://a.org"));
        assert_eq!(cache.get("a").unwrap().url, "http://a.org");
    }

    #[test]
    fn test_cache_miss() {
        let cache = DatasetCache::new(60);
        assert!(cache.get("nonexistent").is_none());
    }

    #[test]
    fn test_cache_disabled_with_zero_ttl() {
        let cache = DatasetCache::new(0);
        cache.insert("a".to_string(), dataset("http://a.org"));
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_overwrite() {
        let cache = DatasetCache::new(60);
        cache.insert("a".to_string(), dataset("http://old.org"));
        cache.insert("a".to_string(), dataset("http://new.org"));
        assert_eq!(cache.get("a").unwrap().url, "http://new.org");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_cleanup_keeps_fresh_entries() {
        let cache = DatasetCache::new(60);
        cache.insert("a".to_string(), dataset("http://a.org"));
        cache.cleanup_expired();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_clone_shares_state() {
        let cache1 = DatasetCache::new(60);
        let cache2 = cache1.clone();
        cache1.insert("shared".to_string(), dataset("http://shared.org"));
        assert!(cache2.get("shared").is_some());
    }
}
