use super::{ExecutionContext, StrategyExecutor};
use crate::routing::Strategy;
use crate::types::{ProxyRequest, ProxyResponse};
use crate::Result;
use async_trait::async_trait;

/// Default strategy for unclassified URLs: network, never cached, with an
/// any-store lookup when the network fails.
pub struct NetworkWithCacheFallback;

#[async_trait]
impl StrategyExecutor for NetworkWithCacheFallback {
    fn strategy(&self) -> Strategy {
        Strategy::NetworkWithCacheFallback
    }

    async fn execute(&self, ctx: &ExecutionContext, request: &ProxyRequest) -> Result<ProxyResponse> {
        match ctx.fetch_network(request).await {
            Ok(response) => Ok(response),
            Err(e) => ctx.cache.lookup_any(&request.cache_key()).await.ok_or(e),
        }
    }
}
