//! Wrap-time storage strategy selection.
//!
//! The configured maximum size picks one of three mutually exclusive
//! strategies, fixed for the cache's lifetime:
//!
//! - `Disabled` (`maxsize == 0`): nothing is ever stored; every call is a
//!   miss and only the miss counter moves.
//! - `Unbounded`: a plain map with no ordering bookkeeping and no eviction —
//!   the cheapest per-call overhead, at the price of unbounded memory.
//! - `Bounded`: the [`LruRing`] plus its key → slot index.

use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::MaxSize;
use crate::ring::LruRing;

pub(crate) enum Storage<K, V> {
    Disabled,
    Unbounded(HashMap<K, V>),
    Bounded(LruRing<K, V>),
}

/// Values displaced by an admission, handed back so the caller can release
/// them only after the storage lock is gone. Dropping a displaced value may
/// run arbitrary cleanup code; by then the cache must already be consistent
/// and unlocked.
#[must_use]
pub(crate) struct Displaced<K, V> {
    /// Previous occupant of a reused LRU slot.
    pub(crate) evicted: Option<(K, V)>,
    /// This call's own insertion, handed back untouched when a racing call
    /// already filled the key (or when storage is disabled).
    pub(crate) duplicate: Option<(K, V)>,
}

impl<K, V> Displaced<K, V> {
    fn none() -> Self {
        Self {
            evicted: None,
            duplicate: None,
        }
    }
}

impl<K: Hash + Eq + Clone, V> Storage<K, V> {
    pub(crate) fn for_maxsize(maxsize: MaxSize) -> Self {
        match maxsize {
            MaxSize::Unbounded => Storage::Unbounded(HashMap::new()),
            MaxSize::Bounded(0) => Storage::Disabled,
            MaxSize::Bounded(n) => Storage::Bounded(LruRing::new(n)),
        }
    }

    /// Non-suspending lookup. Under the bounded strategy a hit also promotes
    /// the entry to most-recently-used.
    pub(crate) fn lookup(&mut self, key: &K) -> Option<&V> {
        match self {
            Storage::Disabled => None,
            Storage::Unbounded(map) => map.get(key),
            Storage::Bounded(ring) => ring.get_promote(key),
        }
    }

    /// Stores a freshly computed value, re-checking for a racing insertion
    /// first: an existing entry is never overwritten, so the cache holds at
    /// most one entry per key no matter how the miss-suspension race resolves.
    pub(crate) fn admit(&mut self, key: K, value: V) -> Displaced<K, V> {
        match self {
            Storage::Disabled => Displaced {
                evicted: None,
                duplicate: Some((key, value)),
            },
            Storage::Unbounded(map) => {
                if map.contains_key(&key) {
                    Displaced {
                        evicted: None,
                        duplicate: Some((key, value)),
                    }
                } else {
                    map.insert(key, value);
                    Displaced::none()
                }
            }
            Storage::Bounded(ring) => {
                if ring.contains(&key) {
                    Displaced {
                        evicted: None,
                        duplicate: Some((key, value)),
                    }
                } else {
                    Displaced {
                        evicted: ring.insert(key, value),
                        duplicate: None,
                    }
                }
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Storage::Disabled => 0,
            Storage::Unbounded(map) => map.len(),
            Storage::Bounded(ring) => ring.len(),
        }
    }
}
