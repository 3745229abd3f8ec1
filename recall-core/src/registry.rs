//! Process-global registry of named caches.
//!
//! Every cache built by the `#[memoized]` attribute registers itself here
//! under its function (or custom) name on first call, so statistics can be
//! read and caches can be reset without holding a handle to the wrapped
//! function itself:
//!
//! ```
//! use recall_core::registry;
//!
//! if let Some(info) = registry::info("fetch_user") {
//!     println!("hit rate so far: {} / {}", info.hits, info.hits + info.misses);
//! }
//! ```
//!
//! Registration is keyed by name; registering the same name twice replaces
//! the earlier handle (last one wins), matching the behavior of redefining a
//! function.

use std::collections::HashMap;
use std::hash::Hash;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::cache::MemoCache;
use crate::stats::{CacheInfo, CacheParameters};

/// Control surface shared by every registered cache, independent of its key
/// and value types.
pub trait CacheControl: Send + Sync {
    /// Point-in-time snapshot of counters and sizes.
    fn cache_info(&self) -> CacheInfo;

    /// Empties the cache and zeroes its counters.
    fn cache_clear(&self);

    /// Read-only echo of the wrap-time configuration.
    fn cache_parameters(&self) -> CacheParameters;
}

impl<K, V> CacheControl for MemoCache<K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Clone + Send,
{
    fn cache_info(&self) -> CacheInfo {
        MemoCache::cache_info(self)
    }

    fn cache_clear(&self) {
        MemoCache::cache_clear(self)
    }

    fn cache_parameters(&self) -> CacheParameters {
        MemoCache::cache_parameters(self)
    }
}

static REGISTRY: Lazy<RwLock<HashMap<String, &'static dyn CacheControl>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Registers a cache under `name`. Called automatically by `#[memoized]` on
/// the wrapped function's first invocation.
pub fn register(name: &str, cache: &'static dyn CacheControl) {
    let mut registry = REGISTRY.write();
    registry.insert(name.to_string(), cache);
}

/// The cache registered under `name`, if any.
pub fn get(name: &str) -> Option<&'static dyn CacheControl> {
    let registry = REGISTRY.read();
    registry.get(name).copied()
}

/// Snapshot of the named cache's statistics.
pub fn info(name: &str) -> Option<CacheInfo> {
    get(name).map(CacheControl::cache_info)
}

/// All registered cache names.
pub fn list() -> Vec<String> {
    let registry = REGISTRY.read();
    registry.keys().cloned().collect()
}

/// Clears the named cache (entries and counters). Returns whether a cache
/// with that name was registered.
pub fn reset(name: &str) -> bool {
    match get(name) {
        Some(cache) => {
            cache.cache_clear();
            true
        }
        None => false,
    }
}

/// Forgets every registration. The caches themselves are untouched; this
/// only empties the name index. Mainly useful in tests.
pub fn clear() {
    let mut registry = REGISTRY.write();
    registry.clear();
}
