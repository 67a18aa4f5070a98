//! Offline fallback generator.
//!
//! Terminal handler for requests whose strategy failed: it always produces a
//! response. Order: any-store cache hit, then the offline document for
//! navigations, then a 503 for everything else.

use crate::cache::CacheManager;
use crate::types::{ProxyRequest, ProxyResponse, ResponseSource};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Header marking a synthesized response.
pub const FALLBACK_HEADER: &str = "x-offline-fallback";

/// Text of the offline page shown for failed navigations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineDocument {
    pub title: String,
    pub message: String,
    pub retry_label: String,
}

impl Default for OfflineDocument {
    fn default() -> Self {
        Self {
            title: "You're offline".to_string(),
            message: "This page isn't available without a connection. Check your network and try again."
                .to_string(),
            retry_label: "Retry".to_string(),
        }
    }
}

impl OfflineDocument {
    pub fn render(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
             <title>{title}</title>\n</head>\n<body>\n<main>\n<h1>{title}</h1>\n<p>{message}</p>\n\
             <button type=\"button\" onclick=\"location.reload()\">{retry}</button>\n\
             </main>\n</body>\n</html>\n",
            title = escape_html(&self.title),
            message = escape_html(&self.message),
            retry = escape_html(&self.retry_label),
        )
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub struct OfflineFallback {
    document: Bytes,
}

impl OfflineFallback {
    pub fn new(document: &OfflineDocument) -> Self {
        Self {
            document: Bytes::from(document.render()),
        }
    }

    /// Never fails; cache errors count as a miss.
    pub async fn respond(&self, cache: &CacheManager, request: &ProxyRequest) -> ProxyResponse {
        if let Some(hit) = cache.lookup_any(&request.cache_key()).await {
            debug!(url = %request.url, "fallback served from cache");
            return hit;
        }
        if request.is_navigation() {
            debug!(url = %request.url, "fallback served offline document");
            self.offline_document()
        } else {
            debug!(url = %request.url, "fallback served 503");
            Self::service_unavailable()
        }
    }

    /// 200 so the navigation renders instead of a browser error page.
    pub fn offline_document(&self) -> ProxyResponse {
        ProxyResponse::new(200, self.document.clone())
            .with_header("content-type", "text/html; charset=utf-8")
            .with_header("cache-control", "no-store")
            .with_header(FALLBACK_HEADER, "document")
            .with_source(ResponseSource::Fallback)
    }

    pub fn service_unavailable() -> ProxyResponse {
        ProxyResponse::new(503, "Service Unavailable")
            .with_header("content-type", "text/plain; charset=utf-8")
            .with_header("cache-control", "no-store")
            .with_header(FALLBACK_HEADER, "unavailable")
            .with_source(ResponseSource::Fallback)
    }
}

impl Default for OfflineFallback {
    fn default() -> Self {
        Self::new(&OfflineDocument::default())
    }
}
