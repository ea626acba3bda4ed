//! Expiring key-value cache layered on a `Store`.
//!
//! Entries record their write time and absolute expiry. Eviction is lazy: an
//! expired entry is deleted when it is next read, or when an optional
//! capacity bound forces a purge on write.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::store::{Store, SCHEMA_VERSION};

/// Prefix reserved for cache records in the underlying store.
pub const CACHE_PREFIX: &str = "atmos_cache_";

/// Live forecast data goes stale quickly.
pub const WEATHER_TTL: Duration = Duration::from_secs(10 * 60);

/// Archived observations do not change.
pub const HISTORICAL_TTL: Duration = Duration::from_secs(60 * 60);

/// A cached payload with its write time and expiry (Unix millis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub version: u32,
    pub data: T,
    pub timestamp: i64,
    pub expires_at: i64,
}

impl<T> CacheEntry<T> {
    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        now_millis < self.expires_at
    }
}

/// Entry header, readable without knowing the payload type.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryMeta {
    version: u32,
    timestamp: i64,
    expires_at: i64,
}

enum Lookup {
    Missing,
    Expired,
    Malformed,
    Live(String),
}

#[derive(Clone)]
pub struct ExpiringCache {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    max_entries: Option<usize>,
}

impl std::fmt::Debug for ExpiringCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("default_ttl", &self.default_ttl)
            .field("max_entries", &self.max_entries)
            .finish_non_exhaustive()
    }
}

impl ExpiringCache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            default_ttl: WEATHER_TTL,
            max_entries: None,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Bound the number of cache records kept in the store.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", CACHE_PREFIX, key)
    }

    fn parse_meta(raw: &str) -> Option<EntryMeta> {
        serde_json::from_str::<EntryMeta>(raw)
            .ok()
            .filter(|meta| meta.version == SCHEMA_VERSION)
    }

    fn lookup(&self, storage_key: &str, now: i64) -> Lookup {
        let raw = match self.store.get(storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Lookup::Missing,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", storage_key, e);
                return Lookup::Missing;
            }
        };
        match Self::parse_meta(&raw) {
            None => Lookup::Malformed,
            Some(meta) if now >= meta.expires_at => Lookup::Expired,
            Some(_) => Lookup::Live(raw),
        }
    }

    fn discard(&self, storage_key: &str) {
        if let Err(e) = self.store.remove(storage_key) {
            tracing::warn!("Failed to evict {}: {}", storage_key, e);
        }
    }

    /// Full entry for `key` if present and unexpired.
    pub fn entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let storage_key = Self::storage_key(key);
        let now = self.clock.now_millis();

        match self.lookup(&storage_key, now) {
            Lookup::Missing => {
                tracing::debug!("Cache miss for {}", key);
                None
            }
            Lookup::Expired => {
                tracing::debug!("Cache entry for {} expired, evicting", key);
                self.discard(&storage_key);
                None
            }
            Lookup::Malformed => {
                tracing::warn!("Discarding malformed cache entry {}", key);
                self.discard(&storage_key);
                None
            }
            Lookup::Live(raw) => match serde_json::from_str::<CacheEntry<T>>(&raw) {
                Ok(entry) => {
                    tracing::debug!("Cache hit for {}", key);
                    Some(entry)
                }
                Err(e) => {
                    tracing::warn!("Cache entry {} has unexpected shape: {}", key, e);
                    None
                }
            },
        }
    }

    /// Cached value for `key`, or `None` if absent, expired, or unreadable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entry(key).map(|entry| entry.data)
    }

    /// Store `value` with the default TTL.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value`, replacing any existing entry. TTLs below one
    /// millisecond are raised to one so that `expires_at > timestamp` holds.
    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let now = self.clock.now_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1);
        let entry = CacheEntry {
            version: SCHEMA_VERSION,
            data: value,
            timestamp: now,
            expires_at: now.saturating_add(ttl_ms),
        };

        let storage_key = Self::storage_key(key);
        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.store.set(&storage_key, &json) {
            tracing::warn!("Failed to write cache entry {}: {}", key, e);
            return;
        }
        tracing::debug!("Cached {} for {:?}", key, ttl);

        if let Some(max) = self.max_entries {
            self.enforce_capacity(max, &storage_key, now);
        }
    }

    /// Drop the entry for `key`.
    pub fn remove(&self, key: &str) {
        self.discard(&Self::storage_key(key));
    }

    fn owned_keys(&self) -> Vec<String> {
        match self.store.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(CACHE_PREFIX))
                .collect(),
            Err(e) => {
                tracing::warn!("Failed to list cache keys: {}", e);
                Vec::new()
            }
        }
    }

    /// Number of cache records currently in the store, live or not.
    pub fn len(&self) -> usize {
        self.owned_keys().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every cache record, leaving other records in the store alone.
    pub fn clear(&self) {
        let keys = self.owned_keys();
        for key in &keys {
            self.discard(key);
        }
        tracing::info!("Cleared {} cache entries", keys.len());
    }

    /// Remove every expired or malformed cache record. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let mut removed = 0;
        for key in self.owned_keys() {
            if matches!(self.lookup(&key, now), Lookup::Expired | Lookup::Malformed) {
                self.discard(&key);
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::debug!("Purged {} stale cache entries", removed);
        }
        removed
    }

    /// Purge stale entries, then evict the oldest-written ones until at most
    /// `max` remain. The entry just written is never a candidate.
    fn enforce_capacity(&self, max: usize, just_written: &str, now: i64) {
        let keys = self.owned_keys();
        if keys.len() <= max {
            return;
        }

        let mut live: Vec<(i64, String)> = Vec::new();
        let mut total = 0usize;
        for key in keys {
            if key == just_written {
                total += 1;
                continue;
            }
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                _ => continue,
            };
            match Self::parse_meta(&raw) {
                Some(meta) if now < meta.expires_at => {
                    live.push((meta.timestamp, key));
                    total += 1;
                }
                _ => self.discard(&key),
            }
        }

        if total <= max {
            return;
        }
        live.sort();
        let excess = total - max;
        for (_, key) in live.into_iter().take(excess) {
            tracing::debug!("Evicting {} to stay within {} cache entries", key, max);
            self.discard(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;

    const START: i64 = 1_700_000_000_000;

    fn cache_with_clock() -> (ExpiringCache, Arc<MemoryStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(START));
        let cache = ExpiringCache::new(store.clone()).with_clock(clock.clone());
        (cache, store, clock)
    }

    #[test]
    fn test_set_then_get_before_expiry() {
        let (cache, _, clock) = cache_with_clock();
        cache.set_with_ttl("k", &"value".to_string(), Duration::from_secs(60));

        clock.advance(Duration::from_secs(59));
        assert_eq!(cache.get::<String>("k").as_deref(), Some("value"));
    }

    #[test]
    fn test_expired_entry_is_absent_and_removed() {
        let (cache, store, clock) = cache_with_clock();
        cache.set_with_ttl("k", &42u32, Duration::from_secs(60));

        clock.advance(Duration::from_secs(60));
        assert_eq!(cache.get::<u32>("k"), None);
        assert_eq!(store.get("atmos_cache_k").unwrap(), None);
    }

    #[test]
    fn test_default_ttl_is_ten_minutes() {
        let (cache, _, _) = cache_with_clock();
        cache.set("k", &1u8);

        let entry = cache.entry::<u8>("k").unwrap();
        assert_eq!(entry.timestamp, START);
        assert_eq!(entry.expires_at, START + 600_000);
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let (cache, _, clock) = cache_with_clock();
        cache.set("k", &1u8);
        clock.advance(Duration::from_secs(5));
        cache.set("k", &2u8);

        let entry = cache.entry::<u8>("k").unwrap();
        assert_eq!(entry.data, 2);
        assert_eq!(entry.timestamp, START + 5_000);
    }

    #[test]
    fn test_zero_ttl_still_satisfies_invariant() {
        let (cache, _, _) = cache_with_clock();
        cache.set_with_ttl("k", &1u8, Duration::ZERO);

        let entry = cache.entry::<u8>("k").unwrap();
        assert!(entry.expires_at > entry.timestamp);
    }

    #[test]
    fn test_malformed_entry_is_absent() {
        let (cache, store, _) = cache_with_clock();
        store.set("atmos_cache_k", "{oops").unwrap();

        assert_eq!(cache.get::<u8>("k"), None);
        assert_eq!(store.get("atmos_cache_k").unwrap(), None);
    }

    #[test]
    fn test_foreign_version_is_absent() {
        let (cache, store, _) = cache_with_clock();
        store
            .set(
                "atmos_cache_k",
                &format!(r#"{{"version":0,"data":1,"timestamp":0,"expiresAt":{}}}"#, i64::MAX),
            )
            .unwrap();

        assert_eq!(cache.get::<u8>("k"), None);
    }

    #[test]
    fn test_wrong_payload_type_is_absent() {
        let (cache, _, _) = cache_with_clock();
        cache.set("k", &"text".to_string());
        assert_eq!(cache.get::<u32>("k"), None);
    }

    #[test]
    fn test_clear_only_touches_cache_records() {
        let (cache, store, _) = cache_with_clock();
        cache.set("weather_40.71_-74.01", &1u8);
        cache.set("historical_1.00_2.00_2026-01-01_2026-01-02", &2u8);
        store.set("atmos_favorites", "[]").unwrap();

        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(store.get("atmos_favorites").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_purge_expired() {
        let (cache, _, clock) = cache_with_clock();
        cache.set_with_ttl("short", &1u8, Duration::from_secs(1));
        cache.set_with_ttl("long", &2u8, Duration::from_secs(3600));

        clock.advance(Duration::from_secs(2));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<u8>("long"), Some(2));
    }

    #[test]
    fn test_capacity_evicts_oldest_written() {
        let (cache, _, clock) = cache_with_clock();
        let cache = cache.with_max_entries(3);

        for i in 0..5u8 {
            cache.set(&format!("k{}", i), &i);
            clock.advance(Duration::from_millis(10));
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get::<u8>("k0"), None);
        assert_eq!(cache.get::<u8>("k1"), None);
        assert_eq!(cache.get::<u8>("k4"), Some(4));
    }

    #[test]
    fn test_capacity_prefers_dropping_expired() {
        let (cache, _, clock) = cache_with_clock();
        let cache = cache.with_max_entries(2);

        cache.set_with_ttl("old", &0u8, Duration::from_secs(1));
        cache.set("keep", &1u8);
        clock.advance(Duration::from_secs(2));
        cache.set("new", &2u8);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get::<u8>("keep"), Some(1));
        assert_eq!(cache.get::<u8>("new"), Some(2));
    }
}
