use super::{ExecutionContext, StrategyExecutor};
use crate::routing::Strategy;
use crate::types::{ProxyRequest, ProxyResponse};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Answer from the dynamic store when possible while a refresh runs in the
/// background; wait for the network only when nothing is cached.
pub struct StaleWhileRevalidate;

#[async_trait]
impl StrategyExecutor for StaleWhileRevalidate {
    fn strategy(&self) -> Strategy {
        Strategy::StaleWhileRevalidate
    }

    async fn execute(&self, ctx: &ExecutionContext, request: &ProxyRequest) -> Result<ProxyResponse> {
        let store = ctx.generation.dynamic_store.clone();
        let key = request.cache_key();

        // The refresh starts before the lookup and is never cancelled. Its
        // failure must not reach a caller that was already answered from cache.
        let refresh = {
            let ctx = ctx.clone();
            let request = request.clone();
            let key = key.clone();
            let store = store.clone();
            ctx.clone().spawn_background(async move {
                match ctx.fetch_network(&request).await {
                    Ok(response) => {
                        if response.is_success() {
                            ctx.cache.store(&store, &key, &response).await;
                            debug!(%key, "revalidated");
                        }
                        Ok(response)
                    }
                    Err(e) => {
                        warn!(%key, error = %e, "background revalidation failed");
                        Err(e)
                    }
                }
            })
        };

        if let Some(cached) = ctx.cache.lookup(&store, &key).await {
            return Ok(cached);
        }

        refresh.await.map_err(|e| {
            Error::runtime_with_context(
                "revalidation task aborted",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("stale_while_revalidate"),
            )
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{context, URL};
    use std::time::Duration;

    #[tokio::test]
    async fn test_cached_entry_returned_without_waiting_for_network() {
        let (ctx, _, transport) = context();
        let req = ProxyRequest::get(URL).unwrap();
        ctx.cache
            .store("dynamic-v1", &req.cache_key(), &ProxyResponse::new(200, "stale"))
            .await;
        transport.set_route(URL, ProxyResponse::new(200, "fresh"));
        transport.set_latency(Some(Duration::from_secs(30)));

        let resp = tokio::time::timeout(
            Duration::from_secs(1),
            StaleWhileRevalidate.execute(&ctx, &req),
        )
        .await
        .expect("served from cache without waiting")
        .unwrap();
        assert_eq!(resp.text(), "stale");
        assert_eq!(ctx.background_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_background_refresh_updates_store() {
        let (ctx, _, transport) = context();
        let req = ProxyRequest::get(URL).unwrap();
        ctx.cache
            .store("dynamic-v1", &req.cache_key(), &ProxyResponse::new(200, "stale"))
            .await;
        transport.set_route(URL, ProxyResponse::new(200, "fresh"));

        assert_eq!(StaleWhileRevalidate.execute(&ctx, &req).await.unwrap().text(), "stale");
        ctx.settle().await;
        assert_eq!(StaleWhileRevalidate.execute(&ctx, &req).await.unwrap().text(), "fresh");
    }

    #[tokio::test]
    async fn test_miss_waits_for_network() {
        let (ctx, _, transport) = context();
        transport.set_route(URL, ProxyResponse::new(200, "fresh"));
        let req = ProxyRequest::get(URL).unwrap();

        let resp = StaleWhileRevalidate.execute(&ctx, &req).await.unwrap();
        assert_eq!(resp.text(), "fresh");
        assert!(!resp.is_from_cache());
    }

    #[tokio::test]
    async fn test_background_failure_is_swallowed() {
        let (ctx, _, transport) = context();
        let req = ProxyRequest::get(URL).unwrap();
        ctx.cache
            .store("dynamic-v1", &req.cache_key(), &ProxyResponse::new(200, "stale"))
            .await;
        transport.set_online(false);

        assert_eq!(StaleWhileRevalidate.execute(&ctx, &req).await.unwrap().text(), "stale");
        ctx.settle().await;
        assert_eq!(StaleWhileRevalidate.execute(&ctx, &req).await.unwrap().text(), "stale");
    }

    #[tokio::test]
    async fn test_miss_with_network_failure_propagates() {
        let (ctx, _, transport) = context();
        transport.set_online(false);
        let err = StaleWhileRevalidate
            .execute(&ctx, &ProxyRequest::get(URL).unwrap())
            .await
            .unwrap_err();
        assert!(err.is_network_failure());
    }
}
