use thiserror::Error;

/// Errors raised by the cache layer itself.
///
/// The cache is a pass-through for computation failures: an error returned by
/// the wrapped computation is propagated to the caller unchanged (see
/// [`CallError::Computation`]) and is never wrapped, swallowed, or retried.
/// The two variants below are the only failures the layer adds on its own.
///
/// # Examples
///
/// ```
/// use recall_core::{Error, MaxSize};
///
/// let err = "a few".parse::<MaxSize>().unwrap_err();
/// assert!(matches!(err, Error::InvalidConfiguration(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A `maxsize` specification that is neither a non-negative integer nor
    /// `"unbounded"`. Raised while a cache is being configured, before any
    /// call runs.
    #[error("invalid cache configuration: {0}")]
    InvalidConfiguration(String),

    /// An argument cannot participate in key construction. The offending
    /// call performs no cache mutation.
    #[error("cache key argument ({argument}) is unhashable: {reason}")]
    UnhashableArgument {
        /// Which argument was rejected, e.g. `positional 0` or `named 'base'`.
        argument: String,
        /// Why the value cannot serve as (part of) a key.
        reason: &'static str,
    },
}

/// Error returned by the fallible call path of a memoized function.
///
/// Either the cache layer rejected the call before the computation ran
/// ([`CallError::Cache`]), or the computation itself failed and its error is
/// handed back untouched ([`CallError::Computation`]). A failed computation
/// has already been counted as a miss, but no entry is inserted for it.
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// Key construction or configuration failure; the computation never ran.
    #[error(transparent)]
    Cache(#[from] Error),

    /// The wrapped computation failed; the inner error is unchanged.
    #[error(transparent)]
    Computation(E),
}
