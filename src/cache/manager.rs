//! Cache manager.

use super::backend::CacheRegistry;
use super::key::{CacheKey, CachedResponse};
use crate::types::ProxyResponse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Request-path view of the registry.
///
/// Lookups degrade to a miss and writes degrade to a logged no-op, so storage
/// trouble never changes the outcome of a request.
pub struct CacheManager {
    registry: Arc<dyn CacheRegistry>,
    write_failures: AtomicU64,
    read_failures: AtomicU64,
}

impl CacheManager {
    pub fn new(registry: Arc<dyn CacheRegistry>) -> Self {
        Self {
            registry,
            write_failures: AtomicU64::new(0),
            read_failures: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<dyn CacheRegistry> {
        &self.registry
    }

    pub async fn lookup(&self, store: &str, key: &CacheKey) -> Option<ProxyResponse> {
        match self.registry.match_in(store, key).await {
            Ok(Some(entry)) => {
                debug!(%key, store, "cache hit");
                Some(entry.into_response(store))
            }
            Ok(None) => {
                debug!(%key, store, "cache miss");
                None
            }
            Err(e) => {
                self.read_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%key, store, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    pub async fn lookup_any(&self, key: &CacheKey) -> Option<ProxyResponse> {
        match self.registry.match_any(key).await {
            Ok(Some((store, entry))) => {
                debug!(%key, store = %store, "cache hit (any store)");
                Some(entry.into_response(&store))
            }
            Ok(None) => None,
            Err(e) => {
                self.read_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a snapshot of `response`. Returns whether the write landed.
    pub async fn store(&self, store: &str, key: &CacheKey, response: &ProxyResponse) -> bool {
        match self
            .registry
            .put(store, key, CachedResponse::snapshot(response))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%key, store, error = %e, "cache write failed, response still served");
                false
            }
        }
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    pub fn read_failures(&self) -> u64 {
        self.read_failures.load(Ordering::Relaxed)
    }
}
