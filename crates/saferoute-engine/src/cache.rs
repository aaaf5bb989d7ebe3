//! Age/size eviction for DashMap-backed caches.

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub trait Aged {
    fn created_at(&self) -> Instant;
}

/// Drop entries older than `max_age`, then evict oldest-first until at
/// most `max_entries` remain.
pub fn evict_stale<K, V>(map: &DashMap<K, V>, max_entries: usize, max_age: Duration)
where
    K: Clone + Eq + Hash,
    V: Aged,
{
    let now = Instant::now();
    map.retain(|_, value| now.duration_since(value.created_at()) <= max_age);

    if map.len() <= max_entries {
        return;
    }

    let mut by_age: Vec<(K, Instant)> = map
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().created_at()))
        .collect();
    by_age.sort_by_key(|(_, created_at)| *created_at);

    let excess = by_age.len().saturating_sub(max_entries);
    for (key, _) in by_age.into_iter().take(excess) {
        map.remove(&key);
    }
}
