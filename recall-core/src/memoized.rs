//! A memoized callable built around an argument tuple.
//!
//! [`Memoized`] wraps a computation `Fn(Args) -> Future` and behaves like the
//! original function, except that calls with arguments it has seen before are
//! answered from its [`MemoCache`]. The argument tuple supplies the cache key
//! through [`ToKey`]; each element is either a plain positional value (any
//! [`KeyArg`]) or a [`Named`] pair.
//!
//! ```
//! use recall_core::{Memoized, Named};
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let add = Memoized::new(|(a, b): (i64, i64)| async move { a + b });
//! assert_eq!(add.call((2, 3)).await.unwrap(), 5);
//! assert_eq!(add.call((2, 3)).await.unwrap(), 5);
//! assert_eq!(add.cache_info().hits, 1);
//!
//! let scale = Memoized::new(|(v, Named(_, factor)): (i64, Named<i64>)| async move {
//!     v * factor
//! });
//! assert_eq!(scale.call((6, Named("factor", 7))).await.unwrap(), 42);
//! # });
//! ```

use std::future::Future;
use std::marker::PhantomData;

use crate::cache::MemoCache;
use crate::error::{CallError, Error};
use crate::key::{Key, KeyArg, KeyBuilder};
use crate::stats::{CacheInfo, CacheParameters};

/// A named argument: its name participates in the key, in call order.
///
/// Two calls that differ only in the order of their named arguments produce
/// different keys and are cached separately; names are not normalized.
#[derive(Clone, Copy, Debug)]
pub struct Named<'a, T>(pub &'a str, pub T);

/// One element of an argument tuple: contributes itself to a [`KeyBuilder`]
/// as either a positional or a named argument.
pub trait KeyPiece {
    fn record(&self, builder: &mut KeyBuilder);
}

impl<T: KeyArg> KeyPiece for T {
    fn record(&self, builder: &mut KeyBuilder) {
        builder.positional(self);
    }
}

impl<T: KeyArg> KeyPiece for Named<'_, T> {
    fn record(&self, builder: &mut KeyBuilder) {
        builder.named(self.0, &self.1);
    }
}

/// Argument tuples that can canonicalize themselves into a [`Key`].
///
/// Implemented for tuples of up to eight [`KeyPiece`] elements (and for the
/// empty tuple — zero arguments is a valid key).
pub trait ToKey {
    fn to_key(&self, typed: bool) -> Result<Key, Error>;
}

macro_rules! impl_to_key {
    ($($piece:ident : $idx:tt),*) => {
        impl<$($piece: KeyPiece),*> ToKey for ($($piece,)*) {
            fn to_key(&self, typed: bool) -> Result<Key, Error> {
                #[allow(unused_mut)]
                let mut builder = KeyBuilder::new(typed);
                $( self.$idx.record(&mut builder); )*
                builder.finish()
            }
        }
    };
}

impl_to_key!();
impl_to_key!(A: 0);
impl_to_key!(A: 0, B: 1);
impl_to_key!(A: 0, B: 1, C: 2);
impl_to_key!(A: 0, B: 1, C: 2, D: 3);
impl_to_key!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_to_key!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_to_key!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_to_key!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

/// A computation wrapped with a memoization cache.
///
/// `A` is the argument tuple, `V` the (cloneable) result, `F` the wrapped
/// computation. The wrapper owns its cache; configuration is fixed when the
/// wrapper is built and echoed by [`cache_parameters`](Self::cache_parameters).
pub struct Memoized<A, V, F> {
    func: F,
    cache: MemoCache<Key, V>,
    _args: PhantomData<fn(A) -> V>,
}

impl<A, V, F> Memoized<A, V, F>
where
    A: ToKey,
    V: Clone,
{
    /// Wraps `func` with a default cache (`maxsize = 128`, untyped).
    pub fn new(func: F) -> Self {
        Self::with_cache(func, MemoCache::builder().build())
    }

    /// Wraps `func` with an explicitly configured cache.
    ///
    /// ```
    /// use recall_core::{MemoCache, Memoized};
    ///
    /// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
    /// let doubled = Memoized::with_cache(
    ///     |(n,): (u32,)| async move { n * 2 },
    ///     MemoCache::builder().maxsize(2).typed(true).build(),
    /// );
    /// assert_eq!(doubled.call((21,)).await.unwrap(), 42);
    /// # });
    /// ```
    pub fn with_cache(func: F, cache: MemoCache<Key, V>) -> Self {
        Self {
            func,
            cache,
            _args: PhantomData,
        }
    }

    /// Calls the wrapped computation through the cache.
    ///
    /// Fails only if the arguments cannot form a key; the computation itself
    /// is infallible here (see [`try_call`](Self::try_call) for fallible
    /// computations).
    pub async fn call<Fut>(&self, args: A) -> Result<V, Error>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = V>,
    {
        let key = args.to_key(self.cache.typed())?;
        Ok(self.cache.get_or_compute(key, || (self.func)(args)).await)
    }

    /// Calls a fallible wrapped computation through the cache.
    ///
    /// Computation errors come back unchanged in
    /// [`CallError::Computation`]; they count as misses and are never cached,
    /// so the next call with the same arguments recomputes.
    pub async fn try_call<Fut, E>(&self, args: A) -> Result<V, CallError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let key = args.to_key(self.cache.typed())?;
        self.cache
            .try_get_or_compute(key, || (self.func)(args))
            .await
            .map_err(CallError::Computation)
    }

    /// The underlying cache.
    pub fn cache(&self) -> &MemoCache<Key, V> {
        &self.cache
    }

    pub fn cache_info(&self) -> CacheInfo {
        self.cache.cache_info()
    }

    pub fn cache_clear(&self) {
        self.cache.cache_clear()
    }

    pub fn cache_parameters(&self) -> CacheParameters {
        self.cache.cache_parameters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_call_memoizes() {
        let calls = AtomicU32::new(0);
        let wrapped = Memoized::new(|(a, b): (i64, i64)| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { a * b }
        });

        assert_eq!(wrapped.call((3, 4)).await.unwrap(), 12);
        assert_eq!(wrapped.call((3, 4)).await.unwrap(), 12);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(wrapped.cache_info().hits, 1);

        assert_eq!(wrapped.call((4, 3)).await.unwrap(), 12);
        assert_eq!(calls.load(Ordering::SeqCst), 2, "argument order is key order");
    }

    #[tokio::test]
    async fn test_named_argument_order_is_cached_separately() {
        let calls = AtomicU32::new(0);
        let wrapped = Memoized::new(|(Named(_, x), Named(_, y)): (Named<i64>, Named<i64>)| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { x + y }
        });

        assert_eq!(wrapped.call((Named("x", 1), Named("y", 2))).await.unwrap(), 3);
        assert_eq!(wrapped.call((Named("x", 1), Named("y", 2))).await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Same values, different named order: a distinct key by design.
        assert_eq!(wrapped.call((Named("y", 2), Named("x", 1))).await.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_argument_computation() {
        let calls = AtomicU32::new(0);
        let wrapped = Memoized::new(|(): ()| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { 99 }
        });

        assert_eq!(wrapped.call(()).await.unwrap(), 99);
        assert_eq!(wrapped.call(()).await.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unhashable_argument_surfaces_and_mutates_nothing() {
        let wrapped = Memoized::new(|(x,): (f64,)| async move { x * 2.0 });

        let err = wrapped.call((f64::NAN,)).await.unwrap_err();
        assert!(matches!(err, Error::UnhashableArgument { .. }));
        let info = wrapped.cache_info();
        assert_eq!(info.hits, 0);
        assert_eq!(info.misses, 0);
        assert_eq!(info.currsize, 0);

        // Ordinary floats are fine.
        assert_eq!(wrapped.call((2.5,)).await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_try_call_propagates_computation_errors_uncached() {
        let calls = AtomicU32::new(0);
        let wrapped = Memoized::new(|(n,): (i64,)| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 0 {
                    Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, "negative"))
                } else {
                    Ok(n * 10)
                }
            }
        });

        let err = wrapped.try_call((-1,)).await.unwrap_err();
        assert!(matches!(err, CallError::Computation(_)));
        let err = wrapped.try_call((-1,)).await.unwrap_err();
        assert!(matches!(err, CallError::Computation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2, "failures are never cached");

        assert_eq!(wrapped.try_call((3,)).await.unwrap(), 30);
        assert_eq!(wrapped.try_call((3,)).await.unwrap(), 30);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_cache_configuration_is_echoed() {
        let wrapped = Memoized::with_cache(
            |(n,): (u32,)| async move { n },
            MemoCache::builder().maxsize(2).typed(true).build(),
        );
        let params = wrapped.cache_parameters();
        assert_eq!(params.maxsize, Some(2));
        assert!(params.typed);

        // Bounded eviction applies through the wrapper as well.
        wrapped.call((1,)).await.unwrap();
        wrapped.call((2,)).await.unwrap();
        wrapped.call((3,)).await.unwrap();
        assert_eq!(wrapped.cache_info().currsize, 2);

        wrapped.cache_clear();
        assert_eq!(wrapped.cache_info().currsize, 0);
    }
}
