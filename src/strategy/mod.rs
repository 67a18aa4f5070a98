//! 缓存策略执行模块：四种缓存策略的实现。
//!
//! # Strategy Executors Module
//!
//! Each executor implements one freshness/availability tradeoff. They only
//! see interceptable requests (GET over http/https); the proxy filters
//! everything else out before classification.
//!
//! | Executor | Reads | Writes | On network failure |
//! |----------|-------|--------|--------------------|
//! | [`CacheFirst`] | static store | static store | propagate |
//! | [`NetworkFirst`] | dynamic store (on failure) | dynamic store | dynamic store, else propagate |
//! | [`StaleWhileRevalidate`] | dynamic store | dynamic store (background) | propagate only when nothing was cached |
//! | [`NetworkWithCacheFallback`] | any store (on failure) | nothing | any store, else propagate |
//!
//! A network failure is a transport error or a 5xx response. Only 2xx
//! responses are written to a store. Propagated failures are turned into a
//! response by [`crate::fallback::OfflineFallback`].

mod cache_first;
mod context;
mod network_fallback;
mod network_first;
mod stale_while_revalidate;

pub use cache_first::CacheFirst;
pub use context::ExecutionContext;
pub use network_fallback::NetworkWithCacheFallback;
pub use network_first::NetworkFirst;
pub use stale_while_revalidate::StaleWhileRevalidate;

use crate::routing::Strategy;
use crate::types::{ProxyRequest, ProxyResponse};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait StrategyExecutor: Send + Sync {
    fn strategy(&self) -> Strategy;

    async fn execute(&self, ctx: &ExecutionContext, request: &ProxyRequest) -> Result<ProxyResponse>;
}

static CACHE_FIRST: CacheFirst = CacheFirst;
static NETWORK_FIRST: NetworkFirst = NetworkFirst;
static STALE_WHILE_REVALIDATE: StaleWhileRevalidate = StaleWhileRevalidate;
static NETWORK_WITH_CACHE_FALLBACK: NetworkWithCacheFallback = NetworkWithCacheFallback;

pub fn executor_for(strategy: Strategy) -> &'static dyn StrategyExecutor {
    match strategy {
        Strategy::CacheFirst => &CACHE_FIRST,
        Strategy::NetworkFirst => &NETWORK_FIRST,
        Strategy::StaleWhileRevalidate => &STALE_WHILE_REVALIDATE,
        Strategy::NetworkWithCacheFallback => &NETWORK_WITH_CACHE_FALLBACK,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::ExecutionContext;
    use crate::cache::{CacheManager, MemoryRegistry};
    use crate::lifecycle::Generation;
    use crate::transport::InMemoryTransport;
    use std::sync::Arc;

    pub(crate) fn context() -> (ExecutionContext, Arc<MemoryRegistry>, Arc<InMemoryTransport>) {
        let registry = Arc::new(MemoryRegistry::new());
        let transport = Arc::new(InMemoryTransport::new());
        let ctx = ExecutionContext::new(
            Arc::new(CacheManager::new(registry.clone())),
            transport.clone(),
            Generation::new("v1", "static-v1", "dynamic-v1"),
        );
        (ctx, registry, transport)
    }

    pub(crate) const URL: &str = "https://app.example.com/resource";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_for_matches_strategy() {
        for s in [
            Strategy::CacheFirst,
            Strategy::NetworkFirst,
            Strategy::StaleWhileRevalidate,
            Strategy::NetworkWithCacheFallback,
        ] {
            assert_eq!(executor_for(s).strategy(), s);
        }
    }
}
