//! TTL-keyed lookup caches shared across requests.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// TTL-based keyed cache. Expired entries behave as absent and are
/// evicted lazily; there is no background sweep. Concurrent writes to
/// the same key are last-write-wins.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Get a cached value. An expired entry reads as absent.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries.get(key).and_then(|entry| {
            if entry.stored_at.elapsed() < self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    /// Store a value. When at capacity, expired entries are purged
    /// before inserting.
    pub async fn put(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        if entries.len() >= self.max_entries {
            let now = Instant::now();
            entries.retain(|_, entry| now.duration_since(entry.stored_at) < self.ttl);
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }
}
