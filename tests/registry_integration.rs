//! Integration tests for the registry facade
//!
//! These tests drive `Registry` through its public operations with a manual
//! clock, covering creation, resolution, expiry and analytics end to end.

use chrono::Duration;
use std::collections::HashSet;
use std::sync::Arc;
use stubby::clock::{Clock, ManualClock};
use stubby::config::RegistryConfig;
use stubby::models::DIRECT_REFERRER;
use stubby::storage::MemoryStorage;
use stubby::{Registry, RegistryError};

/// Helper to create a registry on a clock the test controls
fn create_test_registry() -> (Registry, ManualClock) {
    let clock = ManualClock::starting_now();
    let registry = Registry::new(
        RegistryConfig {
            base_url: "https://sho.rt".to_string(),
            ..RegistryConfig::default()
        },
        Arc::new(MemoryStorage::new()),
        Arc::new(clock.clone()),
    );
    (registry, clock)
}

#[tokio::test]
async fn test_create_then_resolve_round_trip() {
    let (registry, _clock) = create_test_registry();

    for url in [
        "https://example.com/page",
        "http://example.org/a/b?c=d&e=f#frag",
        "https://EXAMPLE.com/Mixed%20Case",
    ] {
        let view = registry.create_short_url(url, None, None).await.unwrap();
        assert_eq!(view.original_url, url);
        assert_eq!(view.short_code.len(), 6);
        assert_eq!(view.short_url, format!("https://sho.rt/{}", view.short_code));
        assert!(!view.is_expired);

        assert_eq!(registry.lookup(&view.short_code).await.unwrap().original_url, url);
        assert_eq!(registry.resolve(&view.short_code, None).await.unwrap(), url);
    }
}

#[tokio::test]
async fn test_generated_codes_are_unique() {
    let (registry, _clock) = create_test_registry();

    for i in 0..500 {
        registry
            .create_short_url(&format!("https://example.com/{i}"), None, None)
            .await
            .unwrap();
    }

    let codes: HashSet<String> = registry
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.short_code)
        .collect();
    assert_eq!(codes.len(), 500);
}

#[tokio::test]
async fn test_ttl_boundary() {
    let (registry, clock) = create_test_registry();
    let view = registry
        .create_short_url("https://example.com", Some("ttl"), Some(10))
        .await
        .unwrap();

    clock.set(view.expires_at);
    assert!(registry.resolve("ttl", None).await.is_ok());

    clock.advance(Duration::milliseconds(1));
    assert!(matches!(
        registry.resolve("ttl", None).await,
        Err(RegistryError::Expired(_))
    ));

    // Expiry is terminal
    clock.advance(Duration::days(1));
    assert!(matches!(
        registry.resolve("ttl", None).await,
        Err(RegistryError::Expired(_))
    ));
    assert_eq!(registry.lookup("ttl").await.unwrap().click_count, 1);
}

#[tokio::test]
async fn test_click_accounting() {
    let (registry, clock) = create_test_registry();
    registry
        .create_short_url("https://example.com", Some("count"), None)
        .await
        .unwrap();

    let referrers = [Some("search"), None, Some("mail"), Some("search"), None];
    for referrer in referrers {
        registry.resolve("count", referrer).await.unwrap();
        clock.advance(Duration::seconds(1));
    }

    let view = registry.lookup("count").await.unwrap();
    assert_eq!(view.click_count, 5);
    assert_eq!(view.click_history.len(), 5);
    assert!(view
        .click_history
        .windows(2)
        .all(|pair| pair[0].timestamp < pair[1].timestamp));
    assert_eq!(view.click_history[1].referrer, DIRECT_REFERRER);

    let recent = registry.recent_activity("count", 2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0], view.click_history[4]);
    assert_eq!(recent[1], view.click_history[3]);

    let breakdown = registry.referrer_breakdown("count").await.unwrap();
    assert_eq!(
        breakdown,
        vec![
            (DIRECT_REFERRER.to_string(), 2),
            ("search".to_string(), 2),
            ("mail".to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn test_top_performers_ordering() {
    let (registry, _clock) = create_test_registry();
    for (code, clicks) in [("first", 2), ("second", 5), ("third", 2), ("fourth", 0)] {
        registry
            .create_short_url("https://example.com", Some(code), None)
            .await
            .unwrap();
        for _ in 0..clicks {
            registry.resolve(code, None).await.unwrap();
        }
    }

    let top: Vec<(String, u64)> = registry
        .top_performers(3)
        .await
        .unwrap()
        .into_iter()
        .map(|v| (v.short_code, v.click_count))
        .collect();
    assert_eq!(
        top,
        vec![
            ("second".to_string(), 5),
            ("first".to_string(), 2),
            ("third".to_string(), 2),
        ]
    );

    assert_eq!(registry.top_performers(10).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_custom_shortcode_rules() {
    let (registry, _clock) = create_test_registry();

    let view = registry
        .create_short_url("https://example.com", Some("abc"), None)
        .await
        .unwrap();
    assert_eq!(view.short_code, "abc");

    assert!(matches!(
        registry
            .create_short_url("https://example.com", Some("ab"), None)
            .await,
        Err(RegistryError::InvalidShortcodeFormat(_))
    ));

    assert!(matches!(
        registry
            .create_short_url("https://other.com", Some("abc"), None)
            .await,
        Err(RegistryError::ShortcodeTaken(code)) if code == "abc"
    ));

    // The failed attempt left the original mapping alone
    assert_eq!(
        registry.lookup("abc").await.unwrap().original_url,
        "https://example.com"
    );
}

#[tokio::test]
async fn test_expired_code_is_still_taken() {
    let (registry, clock) = create_test_registry();
    registry
        .create_short_url("https://example.com", Some("stale"), Some(1))
        .await
        .unwrap();
    clock.advance(Duration::minutes(5));

    assert!(matches!(
        registry
            .create_short_url("https://example.com/new", Some("stale"), None)
            .await,
        Err(RegistryError::ShortcodeTaken(_))
    ));
}

#[tokio::test]
async fn test_expiry_scenario() {
    let (registry, clock) = create_test_registry();
    let view = registry
        .create_short_url("https://example.com/page", None, Some(1))
        .await
        .unwrap();

    let url = registry.resolve(&view.short_code, None).await.unwrap();
    assert_eq!(url, "https://example.com/page");
    assert_eq!(registry.lookup(&view.short_code).await.unwrap().click_count, 1);

    clock.advance(Duration::minutes(2));
    assert!(matches!(
        registry.resolve(&view.short_code, None).await,
        Err(RegistryError::Expired(_))
    ));

    let listed = registry.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].short_code, view.short_code);
    assert!(listed[0].is_expired);
    assert_eq!(listed[0].click_count, 1);
}

#[tokio::test]
async fn test_delete_then_reuse_custom_code() {
    let (registry, _clock) = create_test_registry();
    registry
        .create_short_url("https://example.com/old", Some("reuse"), None)
        .await
        .unwrap();
    registry.resolve("reuse", None).await.unwrap();

    registry.delete_short_url("reuse").await.unwrap();
    assert!(matches!(
        registry.resolve("reuse", None).await,
        Err(RegistryError::NotFound(_))
    ));

    let view = registry
        .create_short_url("https://example.com/new", Some("reuse"), None)
        .await
        .unwrap();
    assert_eq!(view.original_url, "https://example.com/new");
    assert_eq!(view.click_count, 0);
    assert_eq!(
        registry.resolve("reuse", None).await.unwrap(),
        "https://example.com/new"
    );
}

#[tokio::test]
async fn test_list_order_and_stats() {
    let (registry, clock) = create_test_registry();
    registry
        .create_short_url("https://example.com/1", Some("one"), Some(1))
        .await
        .unwrap();
    registry
        .create_short_url("https://example.com/2", Some("two"), Some(60))
        .await
        .unwrap();
    registry
        .create_short_url("https://example.com/3", Some("three"), Some(60))
        .await
        .unwrap();

    registry.resolve("one", None).await.unwrap();
    registry.resolve("two", None).await.unwrap();
    registry.resolve("two", Some("ad")).await.unwrap();

    let codes: Vec<String> = registry
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.short_code)
        .collect();
    assert_eq!(codes, vec!["three", "two", "one"]);

    clock.advance(Duration::minutes(2));
    let stats = registry.stats().await.unwrap();
    assert_eq!(stats.total_urls, 3);
    assert_eq!(stats.total_clicks, 3);
    assert_eq!(stats.active_urls, 2);
    assert_eq!(stats.expired_urls, 1);

    // Expired records keep their clicks in the totals but stay unresolvable
    assert!(registry.lookup("one").await.unwrap().is_expired);
    assert_eq!(registry.now(), clock.now());
}

#[tokio::test]
async fn test_failed_operations_do_not_mutate() {
    let (registry, _clock) = create_test_registry();
    registry
        .create_short_url("https://example.com", Some("keep"), None)
        .await
        .unwrap();
    let before = registry.list_all().await.unwrap();

    let _ = registry.create_short_url("::not a url::", None, None).await;
    let _ = registry
        .create_short_url("https://example.com", Some("bad-code"), None)
        .await;
    let _ = registry
        .create_short_url("https://example.com", Some("keep"), None)
        .await;
    let _ = registry.resolve("missing", None).await;
    let _ = registry.delete_short_url("missing").await;

    assert_eq!(registry.list_all().await.unwrap(), before);
}
