use super::core::CacheProxy;
use super::stats::StatsCounters;
use crate::cache::{CacheManager, CacheRegistry, MemoryRegistry};
use crate::config::ProxyConfig;
use crate::control::ControlChannel;
use crate::fallback::OfflineFallback;
use crate::lifecycle::{ControllerSlot, LifecycleManager};
use crate::routing::StrategyClassifier;
use crate::strategy::ExecutionContext;
use crate::sync::DeferredWriteQueue;
use crate::transport::{HttpTransport, Transport};
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Builder for [`CacheProxy`].
///
/// Unset collaborators default to an in-memory registry bounded by
/// `config.limits`, an [`HttpTransport`] built from `config.http`, a fresh
/// controller slot and a write queue replaying through the same transport.
pub struct CacheProxyBuilder {
    config: ProxyConfig,
    registry: Option<Arc<dyn CacheRegistry>>,
    transport: Option<Arc<dyn Transport>>,
    controller: Option<Arc<ControllerSlot>>,
    write_queue: Option<Arc<DeferredWriteQueue>>,
}

impl CacheProxyBuilder {
    pub fn new() -> Self {
        Self {
            config: ProxyConfig::default(),
            registry: None,
            transport: None,
            controller: None,
            write_queue: None,
        }
    }

    pub fn config(mut self, config: ProxyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config_path(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.config = ProxyConfig::from_path(path)?;
        Ok(self)
    }

    pub fn registry(mut self, registry: Arc<dyn CacheRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Share a controller slot between generations built on one registry,
    /// so that a newer build waits for takeover instead of activating.
    pub fn controller(mut self, controller: Arc<ControllerSlot>) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn write_queue(mut self, queue: Arc<DeferredWriteQueue>) -> Self {
        self.write_queue = Some(queue);
        self
    }

    pub fn build(self) -> Result<CacheProxy> {
        let config = self.config;
        config.validate()?;

        let registry = match self.registry {
            Some(r) => r,
            None => Arc::new(MemoryRegistry::with_limits(config.limits.clone())),
        };
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(&config.http)?),
        };
        let controller = self.controller.unwrap_or_default();
        let write_queue = self
            .write_queue
            .unwrap_or_else(|| Arc::new(DeferredWriteQueue::new(transport.clone())));

        let classifier = StrategyClassifier::from_config(&config.routes)?;
        let generation = config.generation();
        let lifecycle = Arc::new(LifecycleManager::new(
            generation.clone(),
            config.resolved_manifest()?,
            registry.clone(),
            transport.clone(),
            controller,
        ));
        let context = ExecutionContext::new(
            Arc::new(CacheManager::new(registry.clone())),
            transport.clone(),
            generation,
        );

        info!(
            generation = %config.generation_id,
            static_store = %config.static_store,
            dynamic_store = %config.dynamic_store,
            registry = registry.name(),
            transport = transport.name(),
            "cache proxy built"
        );

        Ok(CacheProxy {
            fallback: OfflineFallback::new(&config.offline),
            control: ControlChannel::new(lifecycle.clone()),
            config,
            classifier,
            context,
            lifecycle,
            transport,
            write_queue,
            counters: StatsCounters::default(),
        })
    }
}

impl Default for CacheProxyBuilder {
    fn default() -> Self {
        Self::new()
    }
}
