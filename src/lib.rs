//! # Recall
//!
//! Async function memoization with a bounded LRU cache.
//!
//! This crate wraps a suspending computation so that repeated calls with the
//! same arguments return the previously computed result instead of running
//! again. Memory stays bounded through least-recently-used eviction, and
//! every cache exposes hit/miss statistics and a reset operation.
//!
//! ## Features
//!
//! - 🚀 **O(1) everywhere**: lookup, hit promotion, and eviction run in
//!   constant time on an arena-backed recency ring
//! - 🔑 **Pre-hashed keys**: arguments are canonicalized and hashed once per
//!   call, with an allocation-free fast path for single integer/text
//!   arguments
//! - 📏 **Three storage strategies**: disabled (`maxsize = 0`), unbounded,
//!   or bounded LRU — chosen once when the function is wrapped
//! - ⚡ **No lock across `.await`**: a slow computation never blocks other
//!   callers' cache traffic
//! - 🔍 **Result caching**: only `Ok` values of `Result`-returning functions
//!   are stored; errors propagate unchanged and are retried
//! - 🎯 **Type-sensitive mode**: optionally key on argument runtime types
//! - 📈 **Statistics**: `hits / misses / maxsize / currsize` snapshots, per
//!   function, via the global [`registry`]
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! recall = "0.1"
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! Add `#[memoized]` to any async function:
//!
//! ```rust
//! use recall::memoized;
//!
//! #[memoized(maxsize = 64)]
//! async fn slow_square(n: u64) -> u64 {
//!     // imagine a network round-trip here
//!     n * n
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! // First call computes; the second is answered from the cache.
//! assert_eq!(slow_square(12).await, 144);
//! assert_eq!(slow_square(12).await, 144);
//!
//! let info = recall::registry::info("slow_square").unwrap();
//! assert_eq!((info.hits, info.misses), (1, 1));
//! # });
//! ```
//!
//! ## Attribute options
//!
//! - `maxsize`: LRU capacity (default `128`); `0` disables storage, and
//!   `"unbounded"` (or the bare `unbounded` flag) removes the bound
//! - `typed`: argument runtime types participate in key equality
//! - `name`: custom identifier in the [`registry`] (default: function name)
//!
//! ## Without the macro
//!
//! The building blocks are exported for direct use: [`MemoCache`] for any
//! `Hash + Eq + Clone` key, [`Memoized`] for wrapping a closure over an
//! argument tuple (including [`Named`] arguments), and [`KeyBuilder`] /
//! [`make_key`] for canonical keys.
//!
//! ## Concurrency
//!
//! Caches are shared across tasks and threads. All bookkeeping is
//! non-suspending and internally locked; the wrapped computation runs with no
//! lock held. Concurrent calls with the same new key may each run the
//! computation — the first insertion wins, the cache never holds two entries
//! for one key, and every caller gets a valid value. Deduplicating in-flight
//! computations (single-flight) is explicitly out of scope.

// Re-export the macro
pub use recall_macros::memoized;

// Re-export the core engine
pub use recall_core::{
    make_key, Arg, ArgValue, CacheControl, CacheInfo, CacheParameters, CacheStats, CallError,
    Error, HashedSeq, Key, KeyArg, KeyBuilder, KeyPiece, LruRing, MaxSize, MemoCache,
    MemoCacheBuilder, Memoized, Named, ToKey, DEFAULT_MAXSIZE,
};

pub use recall_core::registry;

// Re-exported for macro-generated code and users who need lazy statics
pub use once_cell;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::memoized;
    pub use crate::registry;
    pub use crate::{CacheInfo, MemoCache, Memoized, Named};
}
