//! Offline walkthrough
//!
//! Drives two cache generations against an in-memory network: install,
//! requests while online and offline, an upgrade that waits for takeover,
//! and deferred writes replayed on reconnect.
//!
//! Usage:
//!   RUST_LOG=offline_cache_proxy=debug cargo run --example offline_walkthrough

use offline_cache_proxy::sync::{ConnectivityMonitor, PendingWrite};
use offline_cache_proxy::{
    CacheProxyBuilder, ControllerSlot, InMemoryTransport, MemoryRegistry, ProxyConfig,
    ProxyRequest, ProxyResponse,
};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;

const ORIGIN: &str = "https://app.example.com";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let network = Arc::new(
        InMemoryTransport::new()
            .with_route(&format!("{ORIGIN}/"), ProxyResponse::new(200, "<h1>home</h1>"))
            .with_route(&format!("{ORIGIN}/assets/app.js"), ProxyResponse::new(200, "console.log(1)"))
            .with_route(&format!("{ORIGIN}/assets/logo.png"), ProxyResponse::new(200, "PNG"))
            .with_route(&format!("{ORIGIN}/api/messages"), ProxyResponse::new(200, "[\"hello\"]"))
            .with_route(&format!("{ORIGIN}/dashboard"), ProxyResponse::new(200, "<h1>dashboard</h1>")),
    );
    network.set_route_for(Method::POST, &format!("{ORIGIN}/api/messages"), ProxyResponse::new(201, "{}"));

    let registry = Arc::new(MemoryRegistry::new());
    let controller = Arc::new(ControllerSlot::new());

    let v1 = CacheProxyBuilder::new()
        .config(ProxyConfig {
            origin: Some(ORIGIN.into()),
            precache: vec!["/".into(), "/assets/app.js".into()],
            ..Default::default()
        })
        .registry(registry.clone())
        .transport(network.clone())
        .controller(controller.clone())
        .build()?;

    println!("== install v1");
    println!("{:?}", v1.on_install().await?);
    println!("identify -> {}", v1.on_message(r#"{"type":"IDENTIFY"}"#).await?);

    println!("\n== online");
    for path in ["/assets/logo.png", "/api/messages", "/dashboard"] {
        let resp = v1.fetch(ProxyRequest::navigate(&format!("{ORIGIN}{path}"))?).await?;
        println!("{path:<20} {} {:?}", resp.status, resp.source);
    }
    v1.settle_background().await;

    println!("\n== offline");
    network.set_online(false);
    for path in ["/assets/logo.png", "/api/messages", "/dashboard", "/settings"] {
        let resp = v1.fetch(ProxyRequest::navigate(&format!("{ORIGIN}{path}"))?).await?;
        println!("{path:<20} {} {:?}", resp.status, resp.source);
    }
    let resp = v1.fetch(ProxyRequest::get(&format!("{ORIGIN}/api/unknown"))?).await?;
    println!("{:<20} {} {:?}", "/api/unknown", resp.status, resp.source);

    println!("\n== deferred writes");
    let monitor = ConnectivityMonitor::new(false);
    let replay = v1.replay_on_reconnect(&monitor);
    v1.enqueue_write(PendingWrite::new(format!("{ORIGIN}/api/messages"), serde_json::json!({"text": "sent offline"})))?;
    println!("queued: {}", v1.write_queue().len());
    network.set_online(true);
    monitor.set_online(true);
    for _ in 0..50 {
        if v1.write_queue().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    println!("queued after reconnect: {}", v1.write_queue().len());
    drop(monitor);
    replay.await?;

    println!("\n== upgrade to v2");
    let v2 = CacheProxyBuilder::new()
        .config(ProxyConfig {
            generation_id: "v2".into(),
            static_store: "static-v2".into(),
            origin: Some(ORIGIN.into()),
            precache: vec!["/".into(), "/assets/app.js".into()],
            ..Default::default()
        })
        .registry(registry.clone())
        .transport(network.clone())
        .controller(controller.clone())
        .build()?;
    println!("{:?}", v2.on_install().await?);
    println!("v1 {:?} / v2 {:?}", v1.state(), v2.state());
    println!("take over -> {}", v2.on_message(r#"{"type":"TAKE_OVER_NOW"}"#).await?);
    println!("v1 {:?} / v2 {:?}", v1.state(), v2.state());
    println!("identify -> {}", v2.identify());

    println!("\n{:#?}", v1.stats());
    Ok(())
}
