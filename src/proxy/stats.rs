use crate::types::{ProxyResponse, ResponseSource};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time counters. Facts only; no policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyStats {
    pub intercepted: u64,
    pub bypassed: u64,
    pub served_from_network: u64,
    pub served_from_cache: u64,
    /// Offline documents and 503s synthesized after a total miss.
    pub fallbacks_served: u64,
    /// Strategy failures handed to the fallback, whatever it answered.
    pub strategy_failures: u64,
    /// Cache writes that failed and were swallowed.
    pub cache_write_failures: u64,
    pub cache_read_failures: u64,
    pub background_in_flight: usize,
    pub pending_writes: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    intercepted: AtomicU64,
    bypassed: AtomicU64,
    network: AtomicU64,
    cache: AtomicU64,
    fallback: AtomicU64,
    strategy_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_bypass(&self) {
        self.bypassed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_strategy_failure(&self) {
        self.strategy_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_response(&self, response: &ProxyResponse) {
        self.intercepted.fetch_add(1, Ordering::Relaxed);
        let counter = match response.source {
            ResponseSource::Network => &self.network,
            ResponseSource::Cache { .. } => &self.cache,
            ResponseSource::Fallback => &self.fallback,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Request-path counters only; the proxy fills in the rest.
    pub(crate) fn snapshot(&self) -> ProxyStats {
        ProxyStats {
            intercepted: self.intercepted.load(Ordering::Relaxed),
            bypassed: self.bypassed.load(Ordering::Relaxed),
            served_from_network: self.network.load(Ordering::Relaxed),
            served_from_cache: self.cache.load(Ordering::Relaxed),
            fallbacks_served: self.fallback.load(Ordering::Relaxed),
            strategy_failures: self.strategy_failures.load(Ordering::Relaxed),
            ..ProxyStats::default()
        }
    }
}
