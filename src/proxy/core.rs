use super::stats::{ProxyStats, StatsCounters};
use crate::cache::CacheManager;
use crate::config::ProxyConfig;
use crate::control::{ControlChannel, ControlMessage, ControlReply};
use crate::fallback::OfflineFallback;
use crate::lifecycle::{CleanupReport, InstallOutcome, LifecycleManager, LifecycleState};
use crate::routing::StrategyClassifier;
use crate::strategy::{executor_for, ExecutionContext};
use crate::sync::{spawn_replay_on_reconnect, ConnectivityMonitor, DeferredWriteQueue, FlushReport, PendingWrite};
use crate::transport::Transport;
use crate::types::{ProxyRequest, ProxyResponse};
use crate::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of offering a request to the proxy.
#[derive(Debug)]
pub enum Intercepted {
    /// The proxy answered. Always a response, never an error.
    Handled(ProxyResponse),
    /// Not for the proxy (non-GET, non-http(s), or this generation does not
    /// control traffic). The caller sends it straight to the network.
    Bypass(ProxyRequest),
}

impl Intercepted {
    pub fn is_handled(&self) -> bool {
        matches!(self, Intercepted::Handled(_))
    }

    pub fn into_response(self) -> Option<ProxyResponse> {
        match self {
            Intercepted::Handled(response) => Some(response),
            Intercepted::Bypass(_) => None,
        }
    }
}

/// One cache generation wired to its registry, transport and write queue.
pub struct CacheProxy {
    pub(crate) config: ProxyConfig,
    pub(crate) classifier: StrategyClassifier,
    pub(crate) context: ExecutionContext,
    pub(crate) lifecycle: Arc<LifecycleManager>,
    pub(crate) control: ControlChannel,
    pub(crate) fallback: OfflineFallback,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) write_queue: Arc<DeferredWriteQueue>,
    pub(crate) counters: StatsCounters,
}

impl CacheProxy {
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn classifier(&self) -> &StrategyClassifier {
        &self.classifier
    }

    pub fn lifecycle(&self) -> &Arc<LifecycleManager> {
        &self.lifecycle
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.context.cache
    }

    pub fn write_queue(&self) -> &Arc<DeferredWriteQueue> {
        &self.write_queue
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub async fn on_install(&self) -> Result<InstallOutcome> {
        self.lifecycle.install().await
    }

    pub async fn on_activate(&self) -> Result<CleanupReport> {
        self.lifecycle.activate().await
    }

    /// The controlling generation gives up traffic, e.g. once every client it
    /// served has gone. A waiting generation takes over on its next request.
    pub fn on_detach(&self) -> bool {
        self.lifecycle.detach()
    }

    async fn claim_unattached(&self) -> bool {
        match self.lifecycle.activate_if_unattached().await {
            Ok(report) => report.is_some(),
            Err(e) => {
                warn!(generation = %self.config.generation_id, error = %e, "activation failed");
                false
            }
        }
    }

    /// Route one request through classification, its strategy and, if the
    /// strategy fails, the offline fallback.
    pub async fn on_intercept(&self, request: ProxyRequest) -> Intercepted {
        if !request.is_interceptable() {
            self.counters.record_bypass();
            debug!(method = %request.method, url = %request.url, "bypass: not interceptable");
            return Intercepted::Bypass(request);
        }
        if !self.lifecycle.is_controlling() && !self.claim_unattached().await {
            self.counters.record_bypass();
            debug!(
                url = %request.url,
                generation = %self.config.generation_id,
                "bypass: generation not controlling"
            );
            return Intercepted::Bypass(request);
        }

        let strategy = self.classifier.classify(&request.url);
        debug!(url = %request.url, %strategy, "classified");

        let response = match executor_for(strategy).execute(&self.context, &request).await {
            Ok(response) => response,
            Err(e) => {
                self.counters.record_strategy_failure();
                debug!(url = %request.url, %strategy, error = %e, "strategy failed, using offline fallback");
                self.fallback.respond(&self.context.cache, &request).await
            }
        };
        self.counters.record_response(&response);
        Intercepted::Handled(response)
    }

    /// Like [`on_intercept`](Self::on_intercept) but sends bypassed requests
    /// through the transport. Errors only come from the bypass path.
    pub async fn fetch(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        match self.on_intercept(request).await {
            Intercepted::Handled(response) => Ok(response),
            Intercepted::Bypass(request) => Ok(self.transport.fetch(&request).await?),
        }
    }

    /// Handle a raw JSON control message and return the JSON reply.
    pub async fn on_message(&self, raw: &str) -> Result<String> {
        self.control.handle_json(raw).await
    }

    pub async fn handle_control(&self, message: ControlMessage) -> Result<ControlReply> {
        self.control.handle(message).await
    }

    pub fn identify(&self) -> String {
        self.control.identify().generation_id().to_string()
    }

    pub fn enqueue_write(&self, item: PendingWrite) -> Result<bool> {
        self.write_queue.enqueue(item)
    }

    pub async fn on_connectivity_restored(&self) -> FlushReport {
        self.write_queue.flush_all().await
    }

    /// Replay the write queue on every offline→online edge of `monitor`.
    pub fn replay_on_reconnect(&self, monitor: &ConnectivityMonitor) -> JoinHandle<()> {
        spawn_replay_on_reconnect(self.write_queue.clone(), monitor.subscribe())
    }

    /// Wait for every background revalidation started so far.
    pub async fn settle_background(&self) {
        self.context.settle().await;
    }

    pub fn stats(&self) -> ProxyStats {
        ProxyStats {
            cache_write_failures: self.context.cache.write_failures(),
            cache_read_failures: self.context.cache.read_failures(),
            background_in_flight: self.context.background_in_flight(),
            pending_writes: self.write_queue.len(),
            ..self.counters.snapshot()
        }
    }
}
