//! # offline-cache-proxy
//!
//! 客户端驻留的拦截式缓存代理：按 URL 选择缓存策略，管理版本化缓存代际，离线时提供兜底响应并延迟重放写操作。
//!
//! Client-resident intercepting cache proxy. It sits between an application
//! and the network, picks a caching strategy per request, keeps versioned
//! cache generations, and keeps answering when the network is gone.
//!
//! ## Overview
//!
//! Every outbound GET over http(s) is classified by URL against three ordered
//! pattern groups and handed to one of four strategies. If the strategy
//! fails, the offline fallback answers from any cache store, with an offline
//! page for navigations, or with a 503. Interception never surfaces an error.
//!
//! ## Core Philosophy
//!
//! - **Explicit lifecycle**: install/activate/intercept are method calls on
//!   [`CacheProxy`], not ambient callbacks
//! - **Injected storage**: the cache registry and the network are traits, so
//!   tests and hosts can swap in in-memory versions
//! - **Contained failures**: cache-write failures are logged and swallowed;
//!   only a total miss changes the shape of a response
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use offline_cache_proxy::{CacheProxyBuilder, ProxyConfig, ProxyRequest};
//!
//! #[tokio::main]
//! async fn main() -> offline_cache_proxy::Result<()> {
//!     let proxy = CacheProxyBuilder::new()
//!         .config(ProxyConfig::from_path("proxy.yaml")?)
//!         .build()?;
//!     proxy.on_install().await?;
//!
//!     let response = proxy
//!         .fetch(ProxyRequest::navigate("https://app.example.com/dashboard")?)
//!         .await?;
//!     println!("{} from {:?}", response.status, response.source);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Named cache stores and the error-swallowing cache manager |
//! | [`routing`] | URL pattern groups and the strategy classifier |
//! | [`strategy`] | The four strategy executors |
//! | [`fallback`] | Offline document and 503 generator |
//! | [`lifecycle`] | Generation install, activation and cleanup |
//! | [`sync`] | Deferred write queue and connectivity signal |
//! | [`control`] | `IDENTIFY` / `TAKE_OVER_NOW` control messages |
//! | [`transport`] | Network abstraction (`reqwest` and in-memory) |
//! | [`proxy`] | The facade tying it all together |
//! | [`config`] | YAML/JSON configuration with env overrides |

pub mod cache;
pub mod config;
pub mod control;
pub mod fallback;
pub mod lifecycle;
pub mod proxy;
pub mod routing;
pub mod strategy;
pub mod sync;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheManager, CacheRegistry, MemoryRegistry, StoreLimits};
pub use config::ProxyConfig;
pub use control::{ControlChannel, ControlMessage, ControlReply};
pub use fallback::{OfflineDocument, OfflineFallback};
pub use lifecycle::{ControllerSlot, Generation, InstallOutcome, LifecycleManager, LifecycleState};
pub use proxy::{CacheProxy, CacheProxyBuilder, Intercepted, ProxyStats};
pub use routing::{Strategy, StrategyClassifier};
pub use sync::{ConnectivityMonitor, DeferredWriteQueue, FlushReport, PendingWrite};
pub use transport::{HttpTransport, InMemoryTransport, Transport};
pub use types::{ProxyRequest, ProxyResponse, RequestMode, ResponseSource};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
