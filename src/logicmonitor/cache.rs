// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Single-slot cache of the raw instance listing
//!
//! Toggling between Select and Regex mode, or editing the regex, works over
//! the same instance listing of the current data source instance. The cache
//! keeps the last full listing together with the data source instance id it
//! was fetched for; a lookup with any other id misses.
//!
//! The cache is owned by one resolver (one panel), never shared.

use serde_json::Value;

#[derive(Debug, Default)]
pub struct InstanceCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    scope: i64,
    listing: Value,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached listing for `scope`, or `None` on a miss or scope mismatch
    pub fn get(&self, scope: i64) -> Option<&Value> {
        self.entry
            .as_ref()
            .filter(|entry| entry.scope == scope)
            .map(|entry| &entry.listing)
    }

    /// Replace the slot with a freshly fetched listing
    pub fn put(&mut self, scope: i64, listing: Value) {
        self.entry = Some(CacheEntry { scope, listing });
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Scope of the cached listing, if any
    pub fn scope(&self) -> Option<i64> {
        self.entry.as_ref().map(|entry| entry.scope)
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_cache_misses() {
        let cache = InstanceCache::new();
        assert!(cache.get(1).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_then_get_returns_exact_value() {
        let mut cache = InstanceCache::new();
        let listing = json!({"data": {"items": [{"id": 1, "name": "a-b"}]}});
        cache.put(7, listing.clone());
        assert_eq!(cache.get(7), Some(&listing));
        assert_eq!(cache.scope(), Some(7));
    }

    #[test]
    fn test_invalidate_then_get_misses() {
        let mut cache = InstanceCache::new();
        cache.put(7, json!({"items": []}));
        cache.invalidate();
        assert!(cache.get(7).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_other_scope_misses_without_invalidate() {
        let mut cache = InstanceCache::new();
        cache.put(7, json!({"items": []}));
        assert!(cache.get(8).is_none());
        // The slot itself is untouched
        assert!(cache.get(7).is_some());
    }

    #[test]
    fn test_put_replaces_single_slot() {
        let mut cache = InstanceCache::new();
        cache.put(1, json!(1));
        cache.put(2, json!(2));
        assert!(cache.get(1).is_none());
        assert_eq!(cache.get(2), Some(&json!(2)));
    }
}
