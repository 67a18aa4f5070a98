//! 缓存存储注册表模块：管理多个独立命名、独立版本的缓存存储。
//!
//! # Cache Store Registry Module
//!
//! This module provides the set of named cache stores the strategies read from
//! and write to. Each store is one cache generation (e.g. `static-v3`,
//! `dynamic-v2`) holding request→response pairs.
//!
//! ## Overview
//!
//! - Stores are created on `open` or lazily on the first `put`
//! - Any-store lookups search stores in creation order
//! - There is no per-entry TTL: freshness comes from strategy choice and from
//!   whole-generation replacement at activation time
//! - Write failures (quota) are surfaced by the registry but swallowed by
//!   [`CacheManager`], so a failed cache write never fails a request
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`CacheRegistry`] | Trait for pluggable registry implementations |
//! | [`MemoryRegistry`] | In-memory registry with optional LRU cap and byte quota |
//! | [`CacheManager`] | Error-swallowing façade used by the strategy executors |
//! | [`CacheKey`] | Canonical `METHOD url` key (fragment stripped) |
//! | [`CachedResponse`] | Stored response snapshot |
//!
//! ## Example
//!
//! ```rust
//! use offline_cache_proxy::cache::{CacheKey, CacheRegistry, CachedResponse, MemoryRegistry};
//! use offline_cache_proxy::types::ProxyResponse;
//!
//! # tokio_test::block_on(async {
//! let registry = MemoryRegistry::new();
//! let key = CacheKey::parse_get("https://app.example.com/assets/logo.png").unwrap();
//! let resp = ProxyResponse::new(200, "png-bytes");
//! registry.put("static-v1", &key, CachedResponse::snapshot(&resp)).await.unwrap();
//!
//! let hit = registry.match_in("static-v1", &key).await.unwrap().unwrap();
//! assert_eq!(hit.body.as_ref(), b"png-bytes");
//! # });
//! ```

mod backend;
mod key;
mod manager;
mod memory;

pub use backend::{CacheError, CacheRegistry};
pub use key::{CacheKey, CachedResponse};
pub use manager::CacheManager;
pub use memory::{MemoryRegistry, RegistryStats, StoreLimits};
