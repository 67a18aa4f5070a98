//! Cache registry trait.

use super::key::{CacheKey, CachedResponse};
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("cache quota exceeded: entry needs {needed} bytes, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("cache store '{0}' not found")]
    StoreNotFound(String),

    #[error("cache storage lock poisoned")]
    Poisoned,
}

/// A set of named stores holding request→response pairs.
///
/// Operations are individually atomic; nothing locks across calls, so
/// concurrent writers to the same key resolve as last-writer-wins.
#[async_trait]
pub trait CacheRegistry: Send + Sync {
    /// Create the store if it does not exist yet.
    async fn open(&self, name: &str) -> Result<(), CacheError>;
    async fn has_store(&self, name: &str) -> Result<bool, CacheError>;
    /// Lookup in one store. A missing store is a miss.
    async fn match_in(
        &self,
        store: &str,
        key: &CacheKey,
    ) -> Result<Option<CachedResponse>, CacheError>;
    /// Lookup across all stores; returns the first hit and the store it came from.
    async fn match_any(
        &self,
        key: &CacheKey,
    ) -> Result<Option<(String, CachedResponse)>, CacheError>;
    /// Insert or replace. Creates the store when absent.
    async fn put(
        &self,
        store: &str,
        key: &CacheKey,
        response: CachedResponse,
    ) -> Result<(), CacheError>;
    async fn delete(&self, store: &str, key: &CacheKey) -> Result<bool, CacheError>;
    async fn keys(&self, store: &str) -> Result<Vec<CacheKey>, CacheError>;
    async fn store_names(&self) -> Result<Vec<String>, CacheError>;
    async fn delete_store(&self, name: &str) -> Result<bool, CacheError>;
    fn name(&self) -> &'static str;
}
