//! Strategy behavior observed through the proxy

mod common;

use common::{config, url, Fixture};
use offline_cache_proxy::cache::{CacheKey, CacheRegistry, CachedResponse};
use offline_cache_proxy::routing::Strategy;
use offline_cache_proxy::{CacheManager, MemoryRegistry, ProxyRequest, ProxyResponse, ResponseSource};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn cache_first_touches_network_once_across_many_requests() {
    let fx = Fixture::installed(config("v1", "static-v1", "dynamic-v1")).await;
    let logo = url("/assets/logo.png");

    for _ in 0..10 {
        let resp = fx.proxy.fetch(ProxyRequest::get(&logo).unwrap()).await.unwrap();
        assert_eq!(resp.text(), "PNG-BYTES");
    }
    assert_eq!(fx.network.calls_for(&logo), 1);
}

#[tokio::test]
async fn precached_assets_never_reach_the_network() {
    let fx = Fixture::installed(config("v1", "static-v1", "dynamic-v1")).await;
    let app_js = url("/assets/app.js");
    assert_eq!(fx.network.calls_for(&app_js), 1);

    let resp = fx.proxy.fetch(ProxyRequest::get(&app_js).unwrap()).await.unwrap();
    assert!(resp.is_from_cache());
    assert_eq!(fx.network.calls_for(&app_js), 1);
}

#[tokio::test]
async fn network_first_returns_stored_response_when_offline() {
    let fx = Fixture::installed(config("v1", "static-v1", "dynamic-v1")).await;
    let messages = url("/api/messages");

    fx.proxy.fetch(ProxyRequest::get(&messages).unwrap()).await.unwrap();
    let key = CacheKey::parse_get(&messages).unwrap();
    assert!(fx.registry.match_in("dynamic-v1", &key).await.unwrap().is_some());

    fx.network.set_online(false);
    let resp = fx.proxy.fetch(ProxyRequest::get(&messages).unwrap()).await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.text(), r#"["hello"]"#);
}

#[tokio::test]
async fn stale_while_revalidate_answers_before_the_network_settles() {
    let fx = Fixture::installed(config("v1", "static-v1", "dynamic-v1")).await;
    let dashboard = url("/dashboard");
    let key = CacheKey::parse_get(&dashboard).unwrap();
    fx.registry
        .put("dynamic-v1", &key, CachedResponse::snapshot(&ProxyResponse::new(200, "stale")))
        .await
        .unwrap();
    fx.network.set_route(&dashboard, ProxyResponse::new(200, "fresh"));
    fx.network.set_latency(Some(Duration::from_millis(400)));

    let started = Instant::now();
    let first = fx.proxy.fetch(ProxyRequest::navigate(&dashboard).unwrap()).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(first.text(), "stale");
    assert_eq!(fx.proxy.stats().background_in_flight, 1);

    fx.proxy.settle_background().await;
    fx.network.set_latency(None);

    let second = fx.proxy.fetch(ProxyRequest::navigate(&dashboard).unwrap()).await.unwrap();
    assert_eq!(second.text(), "fresh");
    fx.proxy.settle_background().await;
}

#[tokio::test]
async fn stale_while_revalidate_refresh_failure_is_invisible() {
    let fx = Fixture::installed(config("v1", "static-v1", "dynamic-v1")).await;
    let dashboard = url("/dashboard");
    fx.proxy.fetch(ProxyRequest::navigate(&dashboard).unwrap()).await.unwrap();
    fx.proxy.settle_background().await;

    fx.network.set_online(false);
    let resp = fx.proxy.fetch(ProxyRequest::navigate(&dashboard).unwrap()).await.unwrap();
    assert_eq!(resp.text(), "<h1>dashboard</h1>");
    fx.proxy.settle_background().await;
    assert_eq!(fx.proxy.stats().strategy_failures, 0);
}

#[tokio::test]
async fn default_strategy_does_not_cache_but_falls_back_to_any_store() {
    let fx = Fixture::installed(config("v1", "static-v1", "dynamic-v1")).await;
    let widget = "https://cdn.other.example/embed/widget";
    assert_eq!(
        fx.proxy.classifier().classify_str(widget).unwrap(),
        Strategy::NetworkWithCacheFallback
    );
    fx.network.set_route(widget, ProxyResponse::new(200, "widget"));

    let resp = fx.proxy.fetch(ProxyRequest::get(widget).unwrap()).await.unwrap();
    assert_eq!(resp.source, ResponseSource::Network);
    let key = CacheKey::parse_get(widget).unwrap();
    assert!(fx.registry.match_any(&key).await.unwrap().is_none());

    // Seed some other generation's store; the default path searches them all.
    fx.registry
        .put("legacy-store", &key, CachedResponse::snapshot(&ProxyResponse::new(200, "seeded")))
        .await
        .unwrap();
    fx.network.set_online(false);
    let resp = fx.proxy.fetch(ProxyRequest::get(widget).unwrap()).await.unwrap();
    assert_eq!(resp.text(), "seeded");
}

#[tokio::test]
async fn client_errors_are_returned_and_never_cached() {
    let fx = Fixture::installed(config("v1", "static-v1", "dynamic-v1")).await;
    let missing = url("/api/missing");

    let resp = fx.proxy.fetch(ProxyRequest::get(&missing).unwrap()).await.unwrap();
    assert_eq!(resp.status, 404);
    assert_eq!(resp.source, ResponseSource::Network);

    fx.network.set_online(false);
    let resp = fx.proxy.fetch(ProxyRequest::get(&missing).unwrap()).await.unwrap();
    assert_eq!(resp.status, 503);
}

#[tokio::test]
async fn overlapping_patterns_resolve_to_the_first_group() {
    let fx = Fixture::build(config("v1", "static-v1", "dynamic-v1"));
    let classifier = fx.proxy.classifier();
    // Matches the API prefix and the static extension pattern.
    assert_eq!(
        classifier.classify_str(&url("/api/export/report.css")).unwrap(),
        Strategy::CacheFirst
    );
    // Matches the API prefix and the page pattern.
    assert_eq!(
        classifier.classify_str("https://api.example.com/dashboard").unwrap(),
        Strategy::NetworkFirst
    );
}

#[tokio::test]
async fn cache_write_failure_still_serves_the_response() {
    let mut cfg = config("v1", "static-v1", "dynamic-v1");
    cfg.precache.clear();
    cfg.limits.max_total_bytes = Some(4);
    let fx = Fixture::installed(cfg).await;

    let resp = fx
        .proxy
        .fetch(ProxyRequest::get(&url("/assets/logo.png")).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.text(), "PNG-BYTES");
    assert_eq!(fx.proxy.stats().cache_write_failures, 1);
}

#[tokio::test]
async fn dynamic_store_is_bounded_by_entry_cap() {
    let mut cfg = config("v1", "static-v1", "dynamic-v1");
    cfg.limits.max_entries_per_store = Some(2);
    cfg.precache = vec!["/".into()];
    let fx = Fixture::installed(cfg).await;

    for i in 0..3 {
        let u = url(&format!("/api/items/{i}"));
        fx.network.set_route(&u, ProxyResponse::new(200, format!("item {i}")));
        fx.proxy.fetch(ProxyRequest::get(&u).unwrap()).await.unwrap();
    }
    let keys = fx.registry.keys("dynamic-v1").await.unwrap();
    assert_eq!(keys.len(), 2);
    assert!(!keys.contains(&CacheKey::parse_get(&url("/api/items/0")).unwrap()));
}

#[tokio::test]
async fn stored_response_round_trips_byte_for_byte() {
    let manager = CacheManager::new(Arc::new(MemoryRegistry::new()));
    let key = CacheKey::parse_get(&url("/assets/blob.bin")).unwrap();
    let body: Vec<u8> = (0..=255u8).collect();
    let original = ProxyResponse::new(206, body.clone()).with_header("etag", "\"abc\"");

    assert!(manager.store("static-v1", &key, &original).await);
    let read = manager.lookup("static-v1", &key).await.unwrap();
    assert_eq!(read.status, 206);
    assert_eq!(read.body.as_ref(), body.as_slice());
    assert_eq!(read.header("etag"), Some("\"abc\""));
}
