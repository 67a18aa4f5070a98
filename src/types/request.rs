//! Outbound request as seen at the interception boundary.

use crate::cache::CacheKey;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::Method;
use std::collections::BTreeMap;
use url::Url;

/// Whether the request loads a top-level document or a sub-resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Full-page navigation; a total miss renders the offline document.
    Navigate,
    /// Script, style, image, XHR/fetch and everything else.
    #[default]
    SubResource,
}

#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub url: Url,
    /// Header names are stored lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
    pub mode: RequestMode,
}

impl ProxyRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            body: None,
            mode: RequestMode::SubResource,
        }
    }

    /// Sub-resource GET.
    pub fn get(url: &str) -> Result<Self> {
        Ok(Self::new(Method::GET, parse_url(url)?))
    }

    /// Top-level navigation GET.
    pub fn navigate(url: &str) -> Result<Self> {
        Ok(Self::get(url)?.with_mode(RequestMode::Navigate))
    }

    pub fn post(url: &str, body: impl Into<Bytes>) -> Result<Self> {
        Ok(Self::new(Method::POST, parse_url(url)?).with_body(body))
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Only GET requests over http(s) go through a caching strategy.
    pub fn is_interceptable(&self) -> bool {
        self.method == Method::GET && matches!(self.url.scheme(), "http" | "https")
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.method, &self.url)
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| {
        Error::validation_with_context(
            format!("invalid request URL '{}'", raw),
            ErrorContext::new()
                .with_details(e.to_string())
                .with_source("request"),
        )
    })
}
