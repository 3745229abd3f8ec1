use recall::{memoized, CacheControl};
use serial_test::serial;

// These tests enumerate and wipe the process-global registry, so they must
// not interleave with each other.

#[memoized(maxsize = 4, name = "registry_custom")]
async fn with_custom_name(n: i64) -> i64 {
    n * 2
}

#[memoized(maxsize = 4)]
async fn with_default_name(n: i64) -> i64 {
    n * 3
}

#[tokio::test]
#[serial]
async fn test_functions_register_under_their_names() {
    with_custom_name(1).await;
    with_default_name(1).await;

    let names = recall::registry::list();
    assert!(names.contains(&"registry_custom".to_string()));
    assert!(names.contains(&"with_default_name".to_string()));
}

#[tokio::test]
#[serial]
async fn test_info_and_reset_through_the_registry() {
    // Start from a clean slate; other tests may have touched this cache.
    with_custom_name(7).await;
    assert!(recall::registry::reset("registry_custom"));

    with_custom_name(7).await;
    with_custom_name(7).await;

    let info = recall::registry::info("registry_custom").unwrap();
    assert_eq!(info.hits, 1);
    assert_eq!(info.misses, 1);
    assert_eq!(info.currsize, 1);

    assert!(recall::registry::reset("registry_custom"));
    let info = recall::registry::info("registry_custom").unwrap();
    assert_eq!(info.hits, 0);
    assert_eq!(info.misses, 0);
    assert_eq!(info.currsize, 0);

    assert!(!recall::registry::reset("registry_never_registered"));
    assert!(recall::registry::info("registry_never_registered").is_none());
}

#[tokio::test]
#[serial]
async fn test_parameters_via_registry_handle() {
    with_custom_name(3).await;
    let handle = recall::registry::get("registry_custom").unwrap();
    let params = handle.cache_parameters();
    assert_eq!(params.maxsize, Some(4));
    assert!(!params.typed);
}
