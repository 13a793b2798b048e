//! In-memory TTL cache for mobile response caching
//!
//! A small map from cache key to `(value, stored_at, ttl)`. Expiry is lazy:
//! a stale entry is removed the moment `get` observes it, so a stale value
//! is never returned. `cleanup` performs an eager sweep and exists only to
//! bound memory between reads; correctness does not depend on it.
//!
//! The cache is process-lifetime only — nothing is persisted.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::clock::{Clock, SystemClock};

/// Default entry lifetime: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > self.ttl
    }
}

/// Thread-safe TTL cache with lazy expiry
///
/// # Type Parameters
/// - `K`: Key type (must be `Eq + Hash + Clone`)
/// - `V`: Value type (must be `Clone`)
/// - `C`: Clock type for time-based operations (defaults to [`SystemClock`])
///
/// # Example
/// ```
/// use rallypoint_common::cache::MobileCache;
///
/// let cache: MobileCache<String, i32> = MobileCache::new();
/// cache.insert("members".to_string(), 42);
/// assert_eq!(cache.get(&"members".to_string()), Some(42));
/// ```
pub struct MobileCache<K, V, C = SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    default_ttl: Duration,
    clock: C,
}

impl<K, V> MobileCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache with the default 5 minute TTL using the system clock
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_TTL, SystemClock)
    }

    /// Create a cache with a custom default TTL using the system clock
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, SystemClock)
    }
}

impl<K, V> Default for MobileCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> MobileCache<K, V, C>
where
    K: Eq + Hash + Clone,
    V: Clone,
    C: Clock,
{
    /// Create a cache with a custom clock (useful for testing)
    pub fn with_clock(default_ttl: Duration, clock: C) -> Self {
        Self { entries: RwLock::new(HashMap::new()), default_ttl, clock }
    }

    /// Insert a value with the default TTL
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Insert a value with an explicit TTL
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let entry = CacheEntry { value, stored_at: self.clock.now(), ttl };
        self.entries.write().insert(key, entry);
    }

    /// Get a value, removing it first if it has expired
    ///
    /// Returns `None` for missing or stale entries; a stale entry is deleted
    /// on observation so it is never returned to any caller.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.write();

        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Remove a single entry regardless of freshness
    pub fn invalidate(&self, key: &K) {
        self.entries.write().remove(key);
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Eagerly sweep out all stale entries
    ///
    /// Intended to run on a periodic timer to bound memory; `get` already
    /// guarantees stale data is never served.
    pub fn cleanup(&self) {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, remaining = entries.len(), "cache cleanup removed stale entries");
        }
    }

    /// Number of entries currently held (stale entries included until swept)
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
