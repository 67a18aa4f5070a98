//! In-memory cache registry.

use super::backend::{CacheError, CacheRegistry};
use super::key::{CacheKey, CachedResponse};
use async_trait::async_trait;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Optional bounds. Both unset means unbounded growth until the generation
/// is replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreLimits {
    /// Least-recently-used entries are evicted past this count.
    pub max_entries_per_store: Option<usize>,
    /// Writes that would push the registry past this many bytes fail with
    /// [`CacheError::QuotaExceeded`].
    pub max_total_bytes: Option<usize>,
}

impl StoreLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries_per_store(mut self, n: usize) -> Self {
        self.max_entries_per_store = Some(n);
        self
    }

    pub fn with_max_total_bytes(mut self, n: usize) -> Self {
        self.max_total_bytes = Some(n);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub errors: u64,
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> RegistryStats {
        RegistryStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

struct NamedStore {
    name: String,
    entries: LruCache<CacheKey, CachedResponse>,
    bytes: usize,
}

impl NamedStore {
    fn new(name: &str, cap: Option<NonZeroUsize>) -> Self {
        Self {
            name: name.to_string(),
            entries: match cap {
                Some(cap) => LruCache::new(cap),
                None => LruCache::unbounded(),
            },
            bytes: 0,
        }
    }
}

/// Registry kept entirely in process memory. Stores are kept in creation order.
pub struct MemoryRegistry {
    stores: Mutex<Vec<NamedStore>>,
    limits: StoreLimits,
    stats: AtomicStats,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::with_limits(StoreLimits::default())
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            stores: Mutex::new(Vec::new()),
            limits,
            stats: AtomicStats::default(),
        }
    }

    pub fn stats(&self) -> RegistryStats {
        self.stats.to_stats()
    }

    pub fn limits(&self) -> &StoreLimits {
        &self.limits
    }

    /// Total bytes held across all stores.
    pub fn total_bytes(&self) -> usize {
        self.lock()
            .map(|stores| stores.iter().map(|s| s.bytes).sum())
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<NamedStore>>, CacheError> {
        self.stores.lock().map_err(|_| {
            self.stats.errors.fetch_add(1, Ordering::Relaxed);
            CacheError::Poisoned
        })
    }

    fn entry_cap(&self) -> Option<NonZeroUsize> {
        self.limits.max_entries_per_store.and_then(NonZeroUsize::new)
    }

    fn position(stores: &[NamedStore], name: &str) -> Option<usize> {
        stores.iter().position(|s| s.name == name)
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheRegistry for MemoryRegistry {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        let mut stores = self.lock()?;
        if Self::position(&stores, name).is_none() {
            stores.push(NamedStore::new(name, self.entry_cap()));
        }
        Ok(())
    }

    async fn has_store(&self, name: &str) -> Result<bool, CacheError> {
        Ok(Self::position(&self.lock()?, name).is_some())
    }

    async fn match_in(
        &self,
        store: &str,
        key: &CacheKey,
    ) -> Result<Option<CachedResponse>, CacheError> {
        let mut stores = self.lock()?;
        let hit = stores
            .iter_mut()
            .find(|s| s.name == store)
            .and_then(|s| s.entries.get(key).cloned());
        match hit {
            Some(_) => self.stats.hits.fetch_add(1, Ordering::Relaxed),
            None => self.stats.misses.fetch_add(1, Ordering::Relaxed),
        };
        Ok(hit)
    }

    async fn match_any(
        &self,
        key: &CacheKey,
    ) -> Result<Option<(String, CachedResponse)>, CacheError> {
        let mut stores = self.lock()?;
        for store in stores.iter_mut() {
            if let Some(entry) = store.entries.get(key) {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some((store.name.clone(), entry.clone())));
            }
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn put(
        &self,
        store: &str,
        key: &CacheKey,
        response: CachedResponse,
    ) -> Result<(), CacheError> {
        let cap = self.entry_cap();
        let mut stores = self.lock()?;
        let size = response.size();

        if let Some(max) = self.limits.max_total_bytes {
            let total: usize = stores.iter().map(|s| s.bytes).sum();
            let replaced = stores
                .iter()
                .find(|s| s.name == store)
                .and_then(|s| s.entries.peek(key))
                .map(CachedResponse::size)
                .unwrap_or(0);
            let available = max.saturating_sub(total.saturating_sub(replaced));
            if size > available {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                return Err(CacheError::QuotaExceeded {
                    needed: size,
                    available,
                });
            }
        }

        let idx = match Self::position(&stores, store) {
            Some(idx) => idx,
            None => {
                stores.push(NamedStore::new(store, cap));
                stores.len() - 1
            }
        };
        let target = &mut stores[idx];
        target.bytes += size;
        if let Some((old_key, old)) = target.entries.push(key.clone(), response) {
            target.bytes = target.bytes.saturating_sub(old.size());
            if &old_key != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.stats.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete(&self, store: &str, key: &CacheKey) -> Result<bool, CacheError> {
        let mut stores = self.lock()?;
        let removed = stores
            .iter_mut()
            .find(|s| s.name == store)
            .and_then(|s| {
                let old = s.entries.pop(key)?;
                s.bytes = s.bytes.saturating_sub(old.size());
                Some(old)
            })
            .is_some();
        if removed {
            self.stats.deletes.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    async fn keys(&self, store: &str) -> Result<Vec<CacheKey>, CacheError> {
        let stores = self.lock()?;
        let idx = Self::position(&stores, store)
            .ok_or_else(|| CacheError::StoreNotFound(store.to_string()))?;
        // LRU iteration runs most-recent first; report insertion-independent order.
        let mut keys: Vec<CacheKey> = stores[idx].entries.iter().map(|(k, _)| k.clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn store_names(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.lock()?.iter().map(|s| s.name.clone()).collect())
    }

    async fn delete_store(&self, name: &str) -> Result<bool, CacheError> {
        let mut stores = self.lock()?;
        match Self::position(&stores, name) {
            Some(idx) => {
                stores.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
