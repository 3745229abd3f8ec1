use std::sync::atomic::{AtomicU32, Ordering};

use recall::memoized;

#[tokio::test]
async fn test_repeat_calls_compute_once() {
    static CALLS: AtomicU32 = AtomicU32::new(0);

    #[memoized]
    async fn double(n: i64) -> i64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        n * 2
    }

    assert_eq!(double(21).await, 42);
    assert_eq!(double(21).await, 42);
    assert_eq!(double(21).await, 42);
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);

    let info = recall::registry::info("double").unwrap();
    assert_eq!(info.hits, 2);
    assert_eq!(info.misses, 1);
    assert_eq!(info.currsize, 1);
    assert_eq!(info.maxsize, Some(recall::DEFAULT_MAXSIZE));
}

#[tokio::test]
async fn test_distinct_arguments_never_hit_each_other() {
    static CALLS: AtomicU32 = AtomicU32::new(0);

    #[memoized(maxsize = 16)]
    async fn shout(word: String, times: u32) -> String {
        CALLS.fetch_add(1, Ordering::SeqCst);
        word.repeat(times as usize)
    }

    assert_eq!(shout("ha".to_string(), 2).await, "haha");
    assert_eq!(shout("ha".to_string(), 3).await, "hahaha");
    assert_eq!(shout("ho".to_string(), 2).await, "hoho");
    assert_eq!(CALLS.load(Ordering::SeqCst), 3);

    assert_eq!(shout("ha".to_string(), 2).await, "haha");
    assert_eq!(CALLS.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_scenario_maxsize_two_promote_and_evict() {
    static CALLS: AtomicU32 = AtomicU32::new(0);

    #[memoized(maxsize = 2, name = "scenario_a")]
    async fn compute(n: i64) -> i64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        n * 100
    }

    // miss, miss, hit (promotes 1), miss (evicts 2), miss, hit.
    assert_eq!(compute(1).await, 100);
    assert_eq!(compute(2).await, 200);
    assert_eq!(compute(1).await, 100);
    assert_eq!(compute(3).await, 300);
    assert_eq!(compute(2).await, 200);
    assert_eq!(compute(1).await, 100);

    assert_eq!(CALLS.load(Ordering::SeqCst), 4);
    let info = recall::registry::info("scenario_a").unwrap();
    assert_eq!(info.hits, 2);
    assert_eq!(info.misses, 4);
    assert_eq!(info.currsize, 2);
}

#[tokio::test]
async fn test_bounded_eviction_drops_exactly_the_oldest() {
    static CALLS: AtomicU32 = AtomicU32::new(0);

    #[memoized(maxsize = 5)]
    async fn tag(n: u64) -> u64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        n + 1000
    }

    // Fill with k0..k4, then insert k5: k0 is evicted, k1..k5 remain.
    for n in 0..6u64 {
        tag(n).await;
    }
    assert_eq!(CALLS.load(Ordering::SeqCst), 6);

    for n in 1..6u64 {
        tag(n).await;
    }
    assert_eq!(CALLS.load(Ordering::SeqCst), 6, "k1..k5 are all hits");

    tag(0).await;
    assert_eq!(CALLS.load(Ordering::SeqCst), 7, "k0 was the eviction victim");
}

#[tokio::test]
async fn test_clear_resets_counters_and_entries() {
    static CALLS: AtomicU32 = AtomicU32::new(0);

    #[memoized(maxsize = 8, name = "clearable")]
    async fn fetch(n: i64) -> i64 {
        CALLS.fetch_add(1, Ordering::SeqCst);
        -n
    }

    fetch(1).await;
    fetch(1).await;
    fetch(2).await;

    assert!(recall::registry::reset("clearable"));
    let info = recall::registry::info("clearable").unwrap();
    assert_eq!(info.hits, 0);
    assert_eq!(info.misses, 0);
    assert_eq!(info.currsize, 0);

    // Previously resident arguments are misses again.
    fetch(1).await;
    assert_eq!(CALLS.load(Ordering::SeqCst), 3);
    assert_eq!(recall::registry::info("clearable").unwrap().misses, 1);
}

#[tokio::test]
async fn test_string_arguments_take_the_fast_key_path() {
    static CALLS: AtomicU32 = AtomicU32::new(0);

    #[memoized(maxsize = 4)]
    async fn greet(name: String) -> String {
        CALLS.fetch_add(1, Ordering::SeqCst);
        format!("hello, {name}")
    }

    assert_eq!(greet("ada".into()).await, "hello, ada");
    assert_eq!(greet("ada".into()).await, "hello, ada");
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}
