//! Recency-ordered storage for the bounded strategy.
//!
//! [`LruRing`] keeps its entries in an arena of slots linked into a circular
//! doubly-linked list by slot *index*, paired with a key → slot lookup map.
//! Index links instead of shared references keep the structure safe without
//! reference-counted cycles, and every operation — lookup, promote, evict,
//! clear — is O(1).
//!
//! Slot `0` is the sentinel: it never holds an entry. The slot linked just
//! before the sentinel is the most-recently-used entry; the slot just after
//! it is the least-recently-used one. The ring and the lookup map jointly own
//! every resident entry: an entry is reachable from both or from neither.

use std::collections::HashMap;
use std::hash::Hash;

/// Sentinel slot index.
const ROOT: usize = 0;

struct Slot<K, V> {
    prev: usize,
    next: usize,
    /// `None` only for the sentinel.
    entry: Option<(K, V)>,
}

/// Bounded recency ring: circular doubly-linked arena plus key → slot index.
///
/// # Examples
///
/// ```
/// use recall_core::LruRing;
///
/// let mut ring = LruRing::new(2);
/// ring.insert(1, "one");
/// ring.insert(2, "two");
///
/// // Touching 1 promotes it, so 2 becomes the eviction candidate.
/// assert_eq!(ring.get_promote(&1), Some(&"one"));
/// let displaced = ring.insert(3, "three");
/// assert_eq!(displaced, Some((2, "two")));
/// assert!(ring.contains(&1));
/// ```
pub struct LruRing<K, V> {
    maxsize: usize,
    slots: Vec<Slot<K, V>>,
    index: HashMap<K, usize>,
    full: bool,
}

impl<K: Hash + Eq + Clone, V> LruRing<K, V> {
    /// Creates an empty ring holding at most `maxsize` entries.
    ///
    /// `maxsize` must be positive; a zero-capacity cache is a separate
    /// storage strategy, not a degenerate ring.
    pub fn new(maxsize: usize) -> Self {
        debug_assert!(maxsize > 0, "LruRing requires a positive capacity");
        let mut slots = Vec::with_capacity(maxsize + 1);
        slots.push(Slot {
            prev: ROOT,
            next: ROOT,
            entry: None,
        });
        Self {
            maxsize,
            slots,
            index: HashMap::with_capacity(maxsize),
            full: false,
        }
    }

    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether the ring has reached its capacity.
    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Looks up `key`; on a hit the entry is unlinked from its current
    /// position and relinked most-recently-used before the value is returned.
    pub fn get_promote(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.unlink(idx);
        self.link_mru(idx);
        self.slots[idx].entry.as_ref().map(|(_, value)| value)
    }

    /// Inserts an entry for a key known to be absent.
    ///
    /// At capacity the least-recently-used slot is reused in place: its
    /// occupant is replaced, the slot is relinked most-recently-used, and the
    /// lookup map is rewritten for the new key — all before the displaced
    /// pair is handed back. The caller must release the returned pair only
    /// after it is done mutating the cache (and after dropping any lock
    /// guarding it), so cleanup code running in the pair's destructor
    /// observes a consistent structure.
    pub fn insert(&mut self, key: K, value: V) -> Option<(K, V)> {
        debug_assert!(
            !self.index.contains_key(&key),
            "insert requires an absent key; re-check after suspension"
        );
        if self.full {
            let idx = self.slots[ROOT].next;
            let displaced = self.slots[idx].entry.replace((key.clone(), value));
            self.unlink(idx);
            self.link_mru(idx);
            if let Some((old_key, _)) = &displaced {
                self.index.remove(old_key);
            }
            self.index.insert(key, idx);
            displaced
        } else {
            let idx = self.slots.len();
            let mru = self.slots[ROOT].prev;
            self.slots.push(Slot {
                prev: mru,
                next: ROOT,
                entry: Some((key.clone(), value)),
            });
            self.slots[mru].next = idx;
            self.slots[ROOT].prev = idx;
            self.index.insert(key, idx);
            self.full = self.index.len() >= self.maxsize;
            None
        }
    }

    /// Drops every entry and returns the ring to its sentinel-only state.
    pub fn clear(&mut self) {
        self.slots.truncate(1);
        self.slots[ROOT].prev = ROOT;
        self.slots[ROOT].next = ROOT;
        self.index.clear();
        self.full = false;
    }

    fn unlink(&mut self, idx: usize) {
        let Slot { prev, next, .. } = self.slots[idx];
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }

    fn link_mru(&mut self, idx: usize) {
        let mru = self.slots[ROOT].prev;
        self.slots[idx].prev = mru;
        self.slots[idx].next = ROOT;
        self.slots[mru].next = idx;
        self.slots[ROOT].prev = idx;
    }

    /// Entry keys in eviction order, oldest first.
    #[cfg(test)]
    fn keys_oldest_first(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.index.len());
        let mut idx = self.slots[ROOT].next;
        while idx != ROOT {
            if let Some((key, _)) = &self.slots[idx].entry {
                keys.push(key.clone());
            }
            idx = self.slots[idx].next;
        }
        keys
    }

    /// Structural invariant: traversal from the sentinel closes after exactly
    /// `len()` entry slots, links agree in both directions, and the lookup
    /// map and ring agree on membership.
    #[cfg(test)]
    fn check_invariants(&self) {
        let mut seen = 0;
        let mut idx = self.slots[ROOT].next;
        while idx != ROOT {
            assert!(seen < self.slots.len(), "ring does not close on the sentinel");
            let slot = &self.slots[idx];
            assert_eq!(self.slots[slot.next].prev, idx, "mismatched links at {idx}");
            assert_eq!(self.slots[slot.prev].next, idx, "mismatched links at {idx}");
            let (key, _) = slot
                .entry
                .as_ref()
                .unwrap_or_else(|| panic!("linked slot {idx} has no entry"));
            assert_eq!(self.index.get(key), Some(&idx), "index disagrees at {idx}");
            seen += 1;
            idx = slot.next;
        }
        assert_eq!(seen, self.index.len(), "ring and index disagree on count");
        assert!(self.slots[ROOT].entry.is_none(), "sentinel holds an entry");
    }
}
