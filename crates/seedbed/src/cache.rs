//! Registry of in-process caches that hold store-derived state.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use serde_json::Value;
use tracing::debug;

const CACHE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cache");

/// Group membership lookups.
pub const GROUPS_CACHE: &str = "groups";
/// Rendered post bodies.
pub const POST_CONTENT_CACHE: &str = "post-content";
/// General-purpose key/value cache.
pub const GENERIC_CACHE: &str = "generic";
/// Resolved upload paths.
pub const UPLOAD_PATHS_CACHE: &str = "upload-paths";

const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(512) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// A cache the seeder can clear.
pub trait ResettableCache: Send + Sync {
    /// Stable name used in logs and lookups.
    fn name(&self) -> &str;

    /// Drops every cached entry.
    fn reset(&self);
}

/// Bounded LRU cache of JSON values.
#[derive(Debug)]
pub struct KeyValueCache {
    name: String,
    entries: Mutex<LruCache<String, Value>>,
}

impl KeyValueCache {
    /// Builds a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(name: impl Into<String>, capacity: NonZeroUsize) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Builds a cache with the default capacity.
    #[must_use]
    pub fn with_default_capacity(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_CAPACITY)
    }

    /// Reads an entry, promoting it to most recently used.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries().get(key).cloned()
    }

    /// Stores an entry, evicting the least recently used one when full.
    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.entries().put(key.into(), value);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResettableCache for KeyValueCache {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn reset(&self) {
        self.entries().clear();
    }
}

/// Named caches reset together.
#[derive(Clone, Default)]
pub struct CacheRegistry {
    caches: Vec<Arc<dyn ResettableCache>>,
}

impl CacheRegistry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the forum's standard caches.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in [
            GROUPS_CACHE,
            POST_CONTENT_CACHE,
            GENERIC_CACHE,
            UPLOAD_PATHS_CACHE,
        ] {
            registry.register(Arc::new(KeyValueCache::with_default_capacity(name)));
        }
        registry
    }

    /// Adds a cache. A cache registered under an existing name replaces it.
    pub fn register(&mut self, cache: Arc<dyn ResettableCache>) {
        self.caches.retain(|existing| existing.name() != cache.name());
        self.caches.push(cache);
    }

    /// Names of the registered caches in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.caches.iter().map(|cache| cache.name()).collect()
    }

    /// Resets every registered cache and returns how many were reset.
    pub fn reset_all(&self) -> usize {
        for cache in &self.caches {
            cache.reset();
            debug!(target: CACHE_TARGET, cache = cache.name(), "cache reset");
        }
        self.caches.len()
    }
}
