//! 类型模块：定义代理拦截边界上的请求与响应类型。
//!
//! # Types Module
//!
//! This module defines the request/response pair that crosses the interception
//! boundary between the host application and the proxy.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ProxyRequest`] | Outbound request (method, URL, headers, body, navigation mode) |
//! | [`RequestMode`] | Top-level navigation vs. sub-resource fetch |
//! | [`ProxyResponse`] | Response returned to the host, tagged with where it came from |
//! | [`ResponseSource`] | Network, a named cache store, or the offline fallback |
//!
//! ## Example
//!
//! ```rust
//! use offline_cache_proxy::types::{ProxyRequest, RequestMode};
//!
//! let req = ProxyRequest::navigate("https://app.example.com/dashboard").unwrap();
//! assert_eq!(req.mode, RequestMode::Navigate);
//! assert!(req.is_interceptable());
//! ```

pub mod request;
pub mod response;

pub use request::{ProxyRequest, RequestMode};
pub use response::{ProxyResponse, ResponseSource};
