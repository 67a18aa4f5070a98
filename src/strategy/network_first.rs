use super::{ExecutionContext, StrategyExecutor};
use crate::routing::Strategy;
use crate::types::{ProxyRequest, ProxyResponse};
use crate::Result;
use async_trait::async_trait;
use tracing::debug;

/// Always try the network; fall back to the last good response in the
/// dynamic store.
pub struct NetworkFirst;

#[async_trait]
impl StrategyExecutor for NetworkFirst {
    fn strategy(&self) -> Strategy {
        Strategy::NetworkFirst
    }

    async fn execute(&self, ctx: &ExecutionContext, request: &ProxyRequest) -> Result<ProxyResponse> {
        let store = ctx.generation.dynamic_store.as_str();
        let key = request.cache_key();
        match ctx.fetch_network(request).await {
            Ok(response) => {
                if response.is_success() {
                    ctx.cache.store(store, &key, &response).await;
                }
                Ok(response)
            }
            Err(e) if e.is_network_failure() => {
                debug!(url = %request.url, error = %e, "network-first falling back to dynamic store");
                ctx.cache.lookup(store, &key).await.ok_or(e)
            }
            Err(e) => Err(e),
        }
    }
}
