//! Scripted in-process transport.

use super::{Transport, TransportError};
use crate::types::{ProxyRequest, ProxyResponse, ResponseSource};
use async_trait::async_trait;
use reqwest::Method;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

/// Transport answering from a route table, with a switch to simulate losing
/// connectivity. Unknown routes answer 404.
pub struct InMemoryTransport {
    routes: RwLock<HashMap<(Method, String), ProxyResponse>>,
    online: AtomicBool,
    latency: RwLock<Option<Duration>>,
    calls: AtomicUsize,
    log: Mutex<Vec<(Method, String)>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            latency: RwLock::new(None),
            calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Builder form of [`set_route`](Self::set_route).
    pub fn with_route(self, url: &str, response: ProxyResponse) -> Self {
        self.set_route(url, response);
        self
    }

    /// Answer GET `url` with `response`.
    pub fn set_route(&self, url: &str, response: ProxyResponse) {
        self.set_route_for(Method::GET, url, response);
    }

    pub fn set_route_for(&self, method: Method, url: &str, response: ProxyResponse) {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((method, normalize(url)), response);
    }

    pub fn remove_route(&self, url: &str) {
        self.routes
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(Method::GET, normalize(url)));
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Delay applied to every fetch before it settles.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Number of fetch attempts, including ones made while offline.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        let url = normalize(url);
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(_, u)| *u == url)
            .count()
    }

    /// Every attempted request, in order.
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

fn normalize(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| url.to_string())
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse, TransportError> {
        let url = request.url.to_string();
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((request.method.clone(), url.clone()));

        let latency = *self.latency.read().unwrap_or_else(|e| e.into_inner());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if !self.is_online() {
            return Err(TransportError::Offline);
        }

        let routed = self
            .routes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(request.method.clone(), url))
            .cloned();
        Ok(routed
            .unwrap_or_else(|| ProxyResponse::new(404, "not found"))
            .with_source(ResponseSource::Network))
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_and_offline_switch() {
        let t = InMemoryTransport::new()
            .with_route("https://app.example.com/a", ProxyResponse::new(200, "a"));
        let req = ProxyRequest::get("https://app.example.com/a").unwrap();

        let resp = t.fetch(&req).await.unwrap();
        assert_eq!(resp.text(), "a");

        t.set_online(false);
        assert!(matches!(t.fetch(&req).await, Err(TransportError::Offline)));
        assert_eq!(t.calls(), 2);
        assert_eq!(t.calls_for("https://app.example.com/a"), 2);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let t = InMemoryTransport::new();
        let req = ProxyRequest::get("https://app.example.com/missing").unwrap();
        assert_eq!(t.fetch(&req).await.unwrap().status, 404);
    }
}
