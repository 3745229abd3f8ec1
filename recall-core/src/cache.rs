//! The memoization cache and its call orchestration.
//!
//! [`MemoCache`] owns one storage strategy behind a `parking_lot::Mutex` and a
//! pair of atomic counters. The mutex guards only the non-suspending
//! bookkeeping — lookup, promotion, eviction, clear — and is never held
//! across `.await`, so unrelated misses are computed concurrently and a slow
//! computation never blocks other callers' cache traffic.
//!
//! A miss therefore opens a race window: while one call is suspended in its
//! computation, any number of other calls may run complete lookup/insert/
//! evict cycles, including filling the very key the suspended call is
//! computing. The resuming call re-checks the storage before inserting and
//! never overwrites a racing winner; duplicate computation is accepted,
//! duplicate entries are not.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::marker::PhantomData;
use std::str::FromStr;

use parking_lot::Mutex;

use crate::stats::{CacheInfo, CacheParameters, CacheStats};
use crate::storage::Storage;
use crate::Error;

/// Capacity used by a bare `#[memoized]` and `MemoCacheBuilder::default()`.
pub const DEFAULT_MAXSIZE: usize = 128;

/// Wrap-time capacity specification.
///
/// `Bounded(0)` disables storage entirely: every call is a miss and nothing
/// is ever resident. Negative signed inputs coerce to `Bounded(0)` rather
/// than erroring, matching the disabled strategy they ask for.
///
/// # Examples
///
/// ```
/// use recall_core::MaxSize;
///
/// assert_eq!(MaxSize::from(64), MaxSize::Bounded(64));
/// assert_eq!(MaxSize::from(-3), MaxSize::Bounded(0));
/// assert_eq!("unbounded".parse::<MaxSize>().unwrap(), MaxSize::Unbounded);
/// assert!("a few".parse::<MaxSize>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxSize {
    Unbounded,
    Bounded(usize),
}

impl MaxSize {
    /// `None` for unbounded, `Some(n)` for a bounded capacity.
    pub fn as_option(self) -> Option<usize> {
        match self {
            MaxSize::Unbounded => None,
            MaxSize::Bounded(n) => Some(n),
        }
    }

    /// Whether this capacity selects the disabled strategy.
    pub fn is_disabled(self) -> bool {
        matches!(self, MaxSize::Bounded(0))
    }
}

impl fmt::Display for MaxSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxSize::Unbounded => f.write_str("unbounded"),
            MaxSize::Bounded(n) => write!(f, "{n}"),
        }
    }
}

impl From<usize> for MaxSize {
    fn from(n: usize) -> Self {
        MaxSize::Bounded(n)
    }
}

impl From<u32> for MaxSize {
    fn from(n: u32) -> Self {
        MaxSize::Bounded(n as usize)
    }
}

impl From<i32> for MaxSize {
    fn from(n: i32) -> Self {
        MaxSize::from(i64::from(n))
    }
}

impl From<i64> for MaxSize {
    fn from(n: i64) -> Self {
        MaxSize::Bounded(usize::try_from(n).unwrap_or(0))
    }
}

impl From<Option<usize>> for MaxSize {
    fn from(n: Option<usize>) -> Self {
        match n {
            Some(n) => MaxSize::Bounded(n),
            None => MaxSize::Unbounded,
        }
    }
}

impl FromStr for MaxSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unbounded") || trimmed.eq_ignore_ascii_case("none") {
            return Ok(MaxSize::Unbounded);
        }
        if let Ok(n) = trimmed.parse::<usize>() {
            return Ok(MaxSize::Bounded(n));
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Ok(MaxSize::from(n));
        }
        Err(Error::InvalidConfiguration(format!(
            "maxsize must be an integer or \"unbounded\", got \"{s}\""
        )))
    }
}

/// Configures and builds a [`MemoCache`].
///
/// # Examples
///
/// ```
/// use recall_core::{MemoCache, MaxSize};
///
/// let cache: MemoCache<u64, String> = MemoCache::builder()
///     .maxsize(256)
///     .typed(true)
///     .name("lookup_name")
///     .build();
/// assert_eq!(cache.maxsize(), MaxSize::Bounded(256));
/// ```
pub struct MemoCacheBuilder<K, V> {
    maxsize: MaxSize,
    typed: bool,
    name: Option<String>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Default for MemoCacheBuilder<K, V> {
    fn default() -> Self {
        Self {
            maxsize: MaxSize::Bounded(DEFAULT_MAXSIZE),
            typed: false,
            name: None,
            _marker: PhantomData,
        }
    }
}

impl<K, V> fmt::Debug for MemoCacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCacheBuilder")
            .field("maxsize", &self.maxsize)
            .field("typed", &self.typed)
            .field("name", &self.name)
            .finish()
    }
}

impl<K, V> MemoCacheBuilder<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn maxsize(mut self, maxsize: impl Into<MaxSize>) -> Self {
        self.maxsize = maxsize.into();
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.maxsize = MaxSize::Unbounded;
        self
    }

    /// Makes argument runtime types participate in key equality.
    pub fn typed(mut self, typed: bool) -> Self {
        self.typed = typed;
        self
    }

    /// Name under which the cache can be found in the [`crate::registry`].
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn build(self) -> MemoCache<K, V> {
        MemoCache {
            storage: Mutex::new(Storage::for_maxsize(self.maxsize)),
            stats: CacheStats::new(),
            maxsize: self.maxsize,
            typed: self.typed,
            name: self.name,
        }
    }
}

/// A memoization cache: one storage strategy, its counters, and the call
/// orchestration that ties a suspending computation to them.
///
/// The cache is keyed by any `Hash + Eq + Clone` type — canonical [`Key`]s
/// built by a [`KeyBuilder`] for function wrappers, or plain domain keys when
/// used directly. Values are returned by clone, so the cache keeps its copy
/// while callers own theirs.
///
/// [`Key`]: crate::Key
/// [`KeyBuilder`]: crate::KeyBuilder
///
/// # Examples
///
/// ```
/// use recall_core::MemoCache;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let cache: MemoCache<u64, u64> = MemoCache::new(2);
///
/// let v = cache.get_or_compute(10, || async { 100 }).await;
/// assert_eq!(v, 100);
///
/// // Second call with the same key is a hit; the computation never runs.
/// let v = cache.get_or_compute(10, || async { unreachable!() }).await;
/// assert_eq!(v, 100);
/// assert_eq!(cache.cache_info().hits, 1);
/// # });
/// ```
pub struct MemoCache<K, V> {
    storage: Mutex<Storage<K, V>>,
    stats: CacheStats,
    maxsize: MaxSize,
    typed: bool,
    name: Option<String>,
}

impl<K, V> MemoCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    pub fn builder() -> MemoCacheBuilder<K, V> {
        MemoCacheBuilder::default()
    }

    /// A cache with the given capacity and default settings.
    pub fn new(maxsize: impl Into<MaxSize>) -> Self {
        Self::builder().maxsize(maxsize).build()
    }

    /// An unbounded cache — plain memoization with no eviction.
    pub fn unbounded() -> Self {
        Self::builder().unbounded().build()
    }

    /// Non-suspending lookup: a hit promotes the entry to most-recently-used
    /// and returns a clone; either outcome moves the matching counter. Runs
    /// entirely under the storage lock, so it is indivisible with respect to
    /// every other cache operation.
    pub(crate) fn lookup(&self, key: &K) -> Option<V> {
        let mut storage = self.storage.lock();
        match storage.lookup(key) {
            Some(value) => {
                let value = value.clone();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Stores a freshly computed value, re-checking for racing insertions.
    /// Anything displaced — an evicted pair, or this call's own duplicate —
    /// is released only after the storage lock is gone, so destructors that
    /// look back at the cache observe a consistent, unlocked structure.
    fn admit(&self, key: K, value: V) {
        let displaced = {
            let mut storage = self.storage.lock();
            storage.admit(key, value)
        };
        drop(displaced.evicted);
        drop(displaced.duplicate);
    }

    /// Returns the cached value for `key`, or runs `compute` and caches its
    /// result.
    ///
    /// The computation is the sole suspension point: the storage lock is not
    /// held while it runs, and if the returned future is dropped mid-flight
    /// no entry is created (the miss has already been counted).
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let result = self
            .try_get_or_compute(key, || async move { Ok::<V, Infallible>(compute().await) })
            .await;
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get_or_compute`](Self::get_or_compute).
    ///
    /// A computation error propagates to the caller unchanged: the miss has
    /// already been counted, but no entry is inserted, so the next call with
    /// the same key recomputes.
    pub async fn try_get_or_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.lookup(&key) {
            return Ok(hit);
        }
        // Suspension point. Other tasks may run arbitrarily many full
        // lookup/insert/evict/clear cycles before this resumes.
        let value = compute().await?;
        if !self.maxsize.is_disabled() {
            self.admit(key, value.clone());
        }
        Ok(value)
    }

    /// Point-in-time, non-suspending snapshot of the counters and sizes.
    pub fn cache_info(&self) -> CacheInfo {
        let storage = self.storage.lock();
        CacheInfo {
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            maxsize: self.maxsize.as_option(),
            currsize: storage.len(),
        }
    }

    /// Empties the storage and zeroes both counters.
    ///
    /// A call currently suspended in its computation is unaffected: its
    /// eventual insertion proceeds against the post-clear empty state. The
    /// retired entries are dropped after the lock is released.
    pub fn cache_clear(&self) {
        let retired = {
            let mut storage = self.storage.lock();
            let retired = std::mem::replace(&mut *storage, Storage::for_maxsize(self.maxsize));
            self.stats.reset();
            retired
        };
        drop(retired);
    }

    /// Read-only echo of the wrap-time configuration.
    pub fn cache_parameters(&self) -> CacheParameters {
        CacheParameters {
            maxsize: self.maxsize.as_option(),
            typed: self.typed,
        }
    }

    pub fn maxsize(&self) -> MaxSize {
        self.maxsize
    }

    pub fn typed(&self) -> bool {
        self.typed
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl<K, V> fmt::Debug for MemoCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("maxsize", &self.maxsize)
            .field("typed", &self.typed)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
