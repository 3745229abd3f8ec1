//! # Recall Core
//!
//! Core engine for the `recall` memoization library.
//!
//! This crate provides the building blocks the `#[memoized]` attribute is
//! generated against, all usable on their own:
//!
//! - [`Key`] / [`KeyBuilder`] — canonical, pre-hashed cache keys built from
//!   positional and named arguments, with an unwrapped fast path for single
//!   integer/text arguments and optional type-sensitive mode
//! - [`LruRing`] — the bounded storage structure: an arena-backed circular
//!   doubly-linked recency ring with O(1) lookup, promote, and evict
//! - [`MemoCache`] — one storage strategy (disabled / unbounded / bounded
//!   LRU, chosen at build time) plus the call orchestration for suspending
//!   computations
//! - [`Memoized`] — a wrapped computation keyed by an argument tuple
//! - [`CacheStats`] / [`CacheInfo`] — hit/miss counters and snapshots
//! - [`registry`] — process-global name → cache handle map
//!
//! ## Concurrency model
//!
//! All bookkeeping (lookup, hit promotion, eviction, clear, snapshots) runs
//! under a `parking_lot::Mutex` and never suspends; the wrapped computation
//! runs with no lock held, so a slow miss never blocks unrelated callers.
//! Concurrent identical calls may each run the computation — the first
//! insertion wins and the cache never holds two entries for one key.
//! Single-flight deduplication is deliberately out of scope.
//!
//! ## Module Organization
//!
//! - [`key`] - canonical argument values, key construction, the fast path
//! - [`ring`] - the LRU recency ring and its lookup index
//! - [`cache`] - storage strategy selection, the call wrapper, configuration
//! - [`stats`] - counters, snapshots, configuration echo
//! - [`registry`] - the global named-cache registry
//! - [`memoized`] - the argument-tuple function wrapper

mod cache;
mod error;
mod key;
mod memoized;
mod ring;
mod stats;
mod storage;

pub mod registry;

pub use cache::{MaxSize, MemoCache, MemoCacheBuilder, DEFAULT_MAXSIZE};
pub use error::{CallError, Error};
pub use key::{make_key, Arg, ArgValue, HashedSeq, Key, KeyArg, KeyBuilder};
pub use memoized::{KeyPiece, Memoized, Named, ToKey};
pub use registry::CacheControl;
pub use ring::LruRing;
pub use stats::{CacheInfo, CacheParameters, CacheStats};

// Re-exported for macro-generated code.
pub use once_cell;
