//! Cache keys and stored entries.

use crate::types::{ProxyResponse, ResponseSource};
use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;
use url::Url;

/// Canonical request identity: method plus URL without its fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
}

impl CacheKey {
    pub fn new(method: &Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: method.as_str().to_string(),
            url: url.to_string(),
        }
    }

    pub fn get(url: &Url) -> Self {
        Self::new(&Method::GET, url)
    }

    pub fn parse_get(raw: &str) -> Option<Self> {
        Url::parse(raw).ok().map(|u| Self::get(&u))
    }

    pub fn as_canonical(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// A response as persisted in a store.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
    pub stored_at: SystemTime,
}

impl CachedResponse {
    /// Take an independent copy of `response` so the original can still be
    /// handed back to the caller.
    pub fn snapshot(response: &ProxyResponse) -> Self {
        Self {
            status: response.status,
            headers: response.headers.clone(),
            body: Bytes::copy_from_slice(&response.body),
            stored_at: SystemTime::now(),
        }
    }

    /// Approximate footprint used for quota accounting.
    pub fn size(&self) -> usize {
        let headers: usize = self.headers.iter().map(|(k, v)| k.len() + v.len()).sum();
        self.body.len() + headers
    }

    pub fn into_response(self, store: &str) -> ProxyResponse {
        ProxyResponse {
            status: self.status,
            headers: self.headers,
            body: self.body,
            source: ResponseSource::Cache {
                store: store.to_string(),
            },
        }
    }
}
