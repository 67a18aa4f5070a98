//! Shared fixtures for integration tests

#![allow(dead_code)]

use offline_cache_proxy::{
    CacheProxy, CacheProxyBuilder, ControllerSlot, InMemoryTransport, MemoryRegistry,
    ProxyConfig, ProxyResponse,
};
use std::sync::Arc;

pub const ORIGIN: &str = "https://app.example.com";

pub fn url(path: &str) -> String {
    format!("{ORIGIN}{path}")
}

/// Network with the app shell, a few assets, an API and the page routes.
pub fn network() -> Arc<InMemoryTransport> {
    Arc::new(
        InMemoryTransport::new()
            .with_route(&url("/"), ProxyResponse::new(200, "<h1>home</h1>"))
            .with_route(&url("/assets/app.js"), ProxyResponse::new(200, "console.log('v1')"))
            .with_route(&url("/assets/app.css"), ProxyResponse::new(200, "body{}"))
            .with_route(&url("/assets/logo.png"), ProxyResponse::new(200, "PNG-BYTES"))
            .with_route(&url("/api/messages"), ProxyResponse::new(200, r#"["hello"]"#))
            .with_route(&url("/dashboard"), ProxyResponse::new(200, "<h1>dashboard</h1>")),
    )
}

pub fn config(generation: &str, static_store: &str, dynamic_store: &str) -> ProxyConfig {
    ProxyConfig {
        generation_id: generation.into(),
        static_store: static_store.into(),
        dynamic_store: dynamic_store.into(),
        origin: Some(ORIGIN.into()),
        precache: vec!["/".into(), "/assets/app.js".into(), "/assets/app.css".into()],
        ..Default::default()
    }
}

pub struct Fixture {
    pub proxy: CacheProxy,
    pub network: Arc<InMemoryTransport>,
    pub registry: Arc<MemoryRegistry>,
    pub controller: Arc<ControllerSlot>,
}

impl Fixture {
    pub fn build(config: ProxyConfig) -> Self {
        let network = network();
        let registry = Arc::new(MemoryRegistry::with_limits(config.limits.clone()));
        let controller = Arc::new(ControllerSlot::new());
        Self::build_with(config, network, registry, controller)
    }

    pub fn build_with(
        config: ProxyConfig,
        network: Arc<InMemoryTransport>,
        registry: Arc<MemoryRegistry>,
        controller: Arc<ControllerSlot>,
    ) -> Self {
        let proxy = CacheProxyBuilder::new()
            .config(config)
            .registry(registry.clone())
            .transport(network.clone())
            .controller(controller.clone())
            .build()
            .expect("fixture config is valid");
        Self {
            proxy,
            network,
            registry,
            controller,
        }
    }

    /// Build a second generation sharing this fixture's network, registry and
    /// controller slot.
    pub fn next_generation(&self, config: ProxyConfig) -> CacheProxy {
        CacheProxyBuilder::new()
            .config(config)
            .registry(self.registry.clone())
            .transport(self.network.clone())
            .controller(self.controller.clone())
            .build()
            .expect("fixture config is valid")
    }

    pub async fn installed(config: ProxyConfig) -> Self {
        let fixture = Self::build(config);
        fixture.proxy.on_install().await.expect("install succeeds");
        fixture
    }
}
