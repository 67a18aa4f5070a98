//! 网络传输模块：代理向网络发出请求的抽象。
//!
//! # Transport Module
//!
//! Strategies never talk to the network directly; they go through a
//! [`Transport`]. Any HTTP response (including 4xx/5xx) is `Ok`; only failures
//! to obtain a response at all are [`TransportError`]s. Whether a 5xx counts
//! as a network failure is decided by the strategies, not here.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`HttpTransport`] | `reqwest`-backed transport for real traffic |
//! | [`InMemoryTransport`] | Scripted transport with an online/offline switch |

mod http;
mod memory;

pub use http::{HttpConfig, HttpTransport};
pub use memory::InMemoryTransport;

use crate::types::{ProxyRequest, ProxyResponse};
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, TransportError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network unavailable")]
    Offline,

    #[error("Transport error: {0}")]
    Other(String),
}
