// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Response cache for the nearby-facilities search.
//!
//! Keys are canonical: coordinates snap to a rounding grid and activity
//! filters are sorted and deduplicated, so semantically equivalent queries
//! always map to one entry. Lookups and writes never fail the request; the
//! cache is a latency optimization, not a correctness dependency.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde_json::Value;

/// Grid size for coordinate rounding: three decimals, roughly 111 m at the
/// equator. Coarse enough to merge jittered duplicates, fine against the
/// minimum 100 m search radius.
const COORDINATE_GRID: f64 = 1000.0;

/// Default number of distinct searches kept.
pub const DEFAULT_CAPACITY: usize = 512;

/// Default entry time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Build the canonical cache key for a nearby-facilities query.
///
/// Activity filters must already be allow-list filtered; they are sorted and
/// deduplicated here so parameter order cannot fragment the key space. The
/// radius participates verbatim.
pub fn canonical_key(lat: f64, lng: f64, activities: &[String], radius: u32) -> String {
    let lat = snap(lat);
    let lng = snap(lng);

    let activities_key = if activities.is_empty() {
        "all".to_string()
    } else {
        let mut sorted: Vec<&str> = activities.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.join(",")
    };

    format!("facilities:{lat}:{lng}:{activities_key}:{radius}")
}

fn snap(value: f64) -> f64 {
    let snapped = (value * COORDINATE_GRID).round() / COORDINATE_GRID;
    // Normalize negative zero so -0.0001 and 0.0001 share a key.
    if snapped == 0.0 {
        0.0
    } else {
        snapped
    }
}

struct CacheEntry {
    response: Value,
    inserted_at: Instant,
}

/// In-process LRU cache of search responses.
pub struct SearchCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl SearchCache {
    /// Create a new cache with the given capacity and TTL.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            )),
            ttl,
        }
    }

    /// Get the cached response for a canonical key.
    ///
    /// Returns `None` if not cached or expired.
    pub fn lookup(&self, key: &str) -> Option<Value> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(key) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.response.clone());
            }
            // Expired — remove it
            cache.pop(key);
        }
        None
    }

    /// Store a response under a canonical key.
    pub fn store(&self, key: &str, response: Value) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                key.to_string(),
                CacheEntry {
                    response,
                    inserted_at: Instant::now(),
                },
            );
        }
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equivalent_queries_share_a_key() {
        let a = canonical_key(
            51.50741,
            -0.12781,
            &["yoga".to_string(), "gym".to_string()],
            5000,
        );
        let b = canonical_key(
            51.50742,
            -0.12779,
            &["gym".to_string(), "yoga".to_string()],
            5000,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_queries_get_distinct_keys() {
        let base = canonical_key(51.507, -0.128, &[], 5000);
        assert_ne!(base, canonical_key(51.509, -0.128, &[], 5000));
        assert_ne!(base, canonical_key(51.507, -0.128, &[], 10_000));
        assert_ne!(
            base,
            canonical_key(51.507, -0.128, &["gym".to_string()], 5000)
        );
    }

    #[test]
    fn empty_filter_reads_all() {
        let key = canonical_key(51.507, -0.128, &[], 5000);
        assert_eq!(key, "facilities:51.507:-0.128:all:5000");
    }

    #[test]
    fn duplicate_filters_are_deduplicated() {
        let a = canonical_key(0.0, 0.0, &["gym".to_string(), "gym".to_string()], 500);
        let b = canonical_key(0.0, 0.0, &["gym".to_string()], 500);
        assert_eq!(a, b);
    }

    #[test]
    fn sub_grid_jitter_around_zero_shares_a_key() {
        let a = canonical_key(-0.0001, 0.0001, &[], 500);
        let b = canonical_key(0.0001, -0.0001, &[], 500);
        assert_eq!(a, b);
    }

    #[test]
    fn cache_store_and_lookup() {
        let cache = SearchCache::default();
        assert!(cache.lookup("facilities:1:1:all:500").is_none());

        cache.store("facilities:1:1:all:500", json!([{"id": "f1"}]));
        let hit = cache.lookup("facilities:1:1:all:500").unwrap();
        assert_eq!(hit[0]["id"], "f1");
    }

    #[test]
    fn expired_entries_miss() {
        let cache = SearchCache::new(8, Duration::from_millis(10));
        cache.store("key", json!([]));
        std::thread::sleep(Duration::from_millis(20));
        assert!(cache.lookup("key").is_none());
    }
}
