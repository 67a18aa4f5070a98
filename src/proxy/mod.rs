//! 代理门面模块：把分类、策略执行、离线兜底、生命周期与延迟写入组合为一个入口。
//!
//! # Cache Proxy Facade
//!
//! [`CacheProxy`] is the explicit state machine a thin platform adapter drives.
//! Each platform event maps to one method:
//!
//! | Event | Method |
//! |-------|--------|
//! | install | [`CacheProxy::on_install`] |
//! | activate | [`CacheProxy::on_activate`] |
//! | outbound request | [`CacheProxy::on_intercept`] / [`CacheProxy::fetch`] |
//! | control message | [`CacheProxy::on_message`] |
//! | connectivity restored | [`CacheProxy::on_connectivity_restored`] |
//!
//! ## Example
//!
//! ```rust
//! use offline_cache_proxy::proxy::{CacheProxyBuilder, Intercepted};
//! use offline_cache_proxy::transport::InMemoryTransport;
//! use offline_cache_proxy::types::{ProxyRequest, ProxyResponse};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let transport = Arc::new(
//!     InMemoryTransport::new()
//!         .with_route("https://app.example.com/assets/logo.png", ProxyResponse::new(200, "png")),
//! );
//! let proxy = CacheProxyBuilder::new().transport(transport).build().unwrap();
//! proxy.on_install().await.unwrap();
//!
//! let req = ProxyRequest::get("https://app.example.com/assets/logo.png").unwrap();
//! match proxy.on_intercept(req).await {
//!     Intercepted::Handled(resp) => assert_eq!(resp.status, 200),
//!     Intercepted::Bypass(_) => unreachable!(),
//! }
//! # });
//! ```

mod builder;
mod core;
mod stats;

pub use builder::CacheProxyBuilder;
pub use self::core::{CacheProxy, Intercepted};
pub use stats::ProxyStats;
