use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Hit/miss counters for one cache.
///
/// Counters are atomics with `Relaxed` ordering: they can be bumped and read
/// from any task without taking the storage lock, and a snapshot is cheap.
///
/// # Examples
///
/// ```
/// use recall_core::CacheStats;
///
/// let stats = CacheStats::new();
/// stats.record_hit();
/// stats.record_hit();
/// stats.record_miss();
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert!((stats.hit_rate() - 0.6666).abs() < 0.001);
/// ```
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Records a lookup that found a resident entry.
    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a lookup that found nothing. Failed computations still count
    /// as misses: the counter moves before the computation runs.
    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Fraction of lookups that hit, in `0.0..=1.0`. Zero when nothing has
    /// been looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits() + self.misses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Zeroes both counters.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        Self {
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
        }
    }
}

/// Point-in-time snapshot returned by `cache_info()`.
///
/// `maxsize` is `None` for an unbounded cache. `currsize` is the number of
/// resident entries at the moment of the snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub maxsize: Option<usize>,
    pub currsize: usize,
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheInfo(hits={}, misses={}, maxsize=", self.hits, self.misses)?;
        match self.maxsize {
            Some(n) => write!(f, "{n}")?,
            None => f.write_str("unbounded")?,
        }
        write!(f, ", currsize={})", self.currsize)
    }
}

/// Read-only echo of the configuration a cache was built with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheParameters {
    pub maxsize: Option<usize>,
    pub typed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.misses(), 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_record_and_read() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 2);
        assert!((stats.hit_rate() - 0.3333).abs() < 0.001);
    }

    #[test]
    fn test_reset_zeroes_both_counters() {
        let stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.reset();
        assert_eq!(stats.hits(), 0);
        assert_eq!(stats.misses(), 0);
    }

    #[test]
    fn test_clone_is_independent() {
        let stats = CacheStats::new();
        stats.record_hit();
        let snapshot = stats.clone();
        stats.record_hit();
        assert_eq!(snapshot.hits(), 1);
        assert_eq!(stats.hits(), 2);
    }

    #[test]
    fn test_concurrent_recording() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(CacheStats::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        stats.record_hit();
                    }
                    for _ in 0..500 {
                        stats.record_miss();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(stats.hits(), 8000);
        assert_eq!(stats.misses(), 4000);
    }

    #[test]
    fn test_info_display() {
        let bounded = CacheInfo {
            hits: 3,
            misses: 1,
            maxsize: Some(128),
            currsize: 4,
        };
        assert_eq!(
            bounded.to_string(),
            "CacheInfo(hits=3, misses=1, maxsize=128, currsize=4)"
        );

        let unbounded = CacheInfo {
            hits: 0,
            misses: 0,
            maxsize: None,
            currsize: 0,
        };
        assert_eq!(
            unbounded.to_string(),
            "CacheInfo(hits=0, misses=0, maxsize=unbounded, currsize=0)"
        );
    }
}
