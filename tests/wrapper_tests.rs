// The library-level wrapper: memoizing a closure over an argument tuple,
// without the attribute macro.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use recall::{CallError, Error, MemoCache, Memoized, Named};

#[tokio::test]
async fn test_wrapped_closure_memoizes() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let add = Memoized::new(move |(a, b): (i64, i64)| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            a + b
        }
    });

    assert_eq!(add.call((1, 2)).await.unwrap(), 3);
    assert_eq!(add.call((1, 2)).await.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert_eq!(add.call((2, 1)).await.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 2, "positional order is key order");
}

#[tokio::test]
async fn test_named_arguments_in_different_order_are_distinct_calls() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let area = Memoized::new(
        move |(Named(_, w), Named(_, h)): (Named<u32>, Named<u32>)| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                w * h
            }
        },
    );

    assert_eq!(area.call((Named("w", 3), Named("h", 4))).await.unwrap(), 12);
    assert_eq!(area.call((Named("w", 3), Named("h", 4))).await.unwrap(), 12);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Documented limitation: swapping named order is a distinct key.
    assert_eq!(area.call((Named("h", 4), Named("w", 3))).await.unwrap(), 12);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_bounded_wrapper_evicts_least_recently_used() {
    let square = Memoized::with_cache(
        |(n,): (u64,)| async move { n * n },
        MemoCache::builder().maxsize(2).build(),
    );

    square.call((1,)).await.unwrap();
    square.call((2,)).await.unwrap();
    square.call((1,)).await.unwrap(); // promote 1
    square.call((3,)).await.unwrap(); // evicts 2

    let info = square.cache_info();
    assert_eq!(info.currsize, 2);
    assert_eq!(info.hits, 1);
    assert_eq!(info.misses, 3);

    square.call((2,)).await.unwrap();
    assert_eq!(square.cache_info().misses, 4, "2 was evicted");
    square.call((1,)).await.unwrap();
    assert_eq!(square.cache_info().hits, 2, "1 survived");
}

#[tokio::test]
async fn test_unhashable_argument_error() {
    let noop = Memoized::new(|(x,): (f64,)| async move { x });

    let err = noop.call((f64::NAN,)).await.unwrap_err();
    assert!(matches!(err, Error::UnhashableArgument { .. }));

    let info = noop.cache_info();
    assert_eq!((info.hits, info.misses, info.currsize), (0, 0, 0));
}

#[tokio::test]
async fn test_try_call_separates_cache_and_computation_errors() {
    let parse = Memoized::new(|(text,): (String,)| async move {
        text.parse::<i64>().map_err(|e| e.to_string())
    });

    let value = parse.try_call(("17".to_string(),)).await.unwrap();
    assert_eq!(value, 17);

    let err = parse.try_call(("nope".to_string(),)).await.unwrap_err();
    assert!(matches!(err, CallError::Computation(_)));

    let info = parse.cache_info();
    assert_eq!(info.currsize, 1, "only the Ok value is resident");
    assert_eq!(info.misses, 2);
}

#[tokio::test]
async fn test_mixed_positional_and_named_pieces() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let pad = Memoized::new(
        move |(text, Named(_, width)): (String, Named<usize>)| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                format!("{text:width$}")
            }
        },
    );

    let a = pad.call(("x".to_string(), Named("width", 4))).await.unwrap();
    assert_eq!(a, "x   ");
    pad.call(("x".to_string(), Named("width", 4))).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    pad.call(("x".to_string(), Named("width", 5))).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
