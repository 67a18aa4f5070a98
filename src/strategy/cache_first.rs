use super::{ExecutionContext, StrategyExecutor};
use crate::routing::Strategy;
use crate::types::{ProxyRequest, ProxyResponse};
use crate::Result;
use async_trait::async_trait;

/// Serve from the static store; only a miss touches the network.
pub struct CacheFirst;

#[async_trait]
impl StrategyExecutor for CacheFirst {
    fn strategy(&self) -> Strategy {
        Strategy::CacheFirst
    }

    async fn execute(&self, ctx: &ExecutionContext, request: &ProxyRequest) -> Result<ProxyResponse> {
        let store = ctx.generation.static_store.as_str();
        let key = request.cache_key();
        if let Some(hit) = ctx.cache.lookup(store, &key).await {
            return Ok(hit);
        }

        let response = ctx.fetch_network(request).await?;
        if response.is_success() {
            ctx.cache.store(store, &key, &response).await;
        }
        Ok(response)
    }
}
