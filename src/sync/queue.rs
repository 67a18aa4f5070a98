use crate::transport::Transport;
use crate::types::ProxyRequest;
use crate::{Error, ErrorContext, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub id: String,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
    pub enqueued_at_ms: u64,
    #[serde(default)]
    pub attempts: u32,
}

impl PendingWrite {
    /// JSON POST with a fresh id.
    pub fn new(url: impl Into<String>, body: serde_json::Value) -> Self {
        let enqueued_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self {
            id: Uuid::new_v4().to_string(),
            method: Method::POST.to_string(),
            url: url.into(),
            headers,
            body,
            enqueued_at_ms,
            attempts: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method.to_string();
        self
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn to_request(&self) -> Result<ProxyRequest> {
        let invalid = |field: &str, details: String| {
            Error::validation_with_context(
                format!("pending write '{}' is not replayable", self.id),
                ErrorContext::new()
                    .with_field_path(field)
                    .with_details(details)
                    .with_source("deferred_writes"),
            )
        };
        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|e| invalid("method", e.to_string()))?;
        let url = Url::parse(&self.url).map_err(|e| invalid("url", e.to_string()))?;
        let mut request = ProxyRequest::new(method, url).with_body(serde_json::to_vec(&self.body)?);
        for (name, value) in &self.headers {
            request = request.with_header(name, value.clone());
        }
        Ok(request)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct DeferredWriteQueue {
    items: Mutex<VecDeque<PendingWrite>>,
    transport: Arc<dyn Transport>,
    flushing: tokio::sync::Mutex<()>,
}

impl DeferredWriteQueue {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            transport,
            flushing: tokio::sync::Mutex::new(()),
        }
    }

    /// Queue `item`. Returns `Ok(false)` when an item with the same id is
    /// already queued.
    pub fn enqueue(&self, item: PendingWrite) -> Result<bool> {
        item.to_request()?;
        let mut items = self.lock();
        if items.iter().any(|i| i.id == item.id) {
            debug!(id = %item.id, "duplicate pending write ignored");
            return Ok(false);
        }
        debug!(id = %item.id, url = %item.url, "pending write queued");
        items.push_back(item);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the queue in FIFO order, for the host to persist.
    pub fn snapshot(&self) -> Vec<PendingWrite> {
        self.lock().iter().cloned().collect()
    }

    /// Append previously persisted items, skipping ids already queued.
    /// Returns how many were added.
    pub fn restore(&self, items: Vec<PendingWrite>) -> usize {
        items
            .into_iter()
            .filter(|item| matches!(self.enqueue(item.clone()), Ok(true)))
            .count()
    }

    /// Replay every item queued when the flush starts, oldest first.
    pub async fn flush_all(&self) -> FlushReport {
        let _guard = self.flushing.lock().await;
        let batch = self.snapshot();
        let mut report = FlushReport::default();

        for item in batch {
            match self.replay(&item).await {
                Ok(()) => {
                    self.lock().retain(|i| i.id != item.id);
                    report.succeeded.push(item.id);
                }
                Err(e) => {
                    warn!(id = %item.id, error = %e, "replay failed, keeping item queued");
                    if let Some(queued) = self.lock().iter_mut().find(|i| i.id == item.id) {
                        queued.attempts = queued.attempts.saturating_add(1);
                    }
                    report.failed.push(item.id);
                }
            }
        }

        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            remaining = self.len(),
            "deferred writes flushed"
        );
        report
    }

    async fn replay(&self, item: &PendingWrite) -> Result<()> {
        let request = item.to_request()?;
        let response = self.transport.fetch(&request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(Error::Upstream {
                status: response.status,
                url: item.url.clone(),
            })
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingWrite>> {
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InMemoryTransport;
    use crate::types::ProxyResponse;
    use serde_json::json;

    const OUTBOX: &str = "https://app.example.com/api/messages";

    fn transport() -> Arc<InMemoryTransport> {
        let t = Arc::new(InMemoryTransport::new());
        t.set_route_for(Method::POST, OUTBOX, ProxyResponse::new(201, "{}"));
        t
    }

    #[tokio::test]
    async fn test_flush_replays_in_fifo_order() {
        let t = transport();
        let q = DeferredWriteQueue::new(t.clone());
        for i in 0..3 {
            q.enqueue(PendingWrite::new(OUTBOX, json!({ "n": i })).with_id(format!("m{}", i)))
                .unwrap();
        }

        let report = q.flush_all().await;
        assert_eq!(report.succeeded, vec!["m0", "m1", "m2"]);
        assert!(q.is_empty());
        assert_eq!(t.calls(), 3);
    }

    #[tokio::test]
    async fn test_failed_item_stays_and_does_not_block_others() {
        let t = transport();
        let q = DeferredWriteQueue::new(t.clone());
        q.enqueue(PendingWrite::new("https://app.example.com/api/broken", json!({})).with_id("bad"))
            .unwrap();
        q.enqueue(PendingWrite::new(OUTBOX, json!({})).with_id("good")).unwrap();

        let report = q.flush_all().await;
        assert_eq!(report.succeeded, vec!["good"]);
        assert_eq!(report.failed, vec!["bad"]);
        let left = q.snapshot();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, "bad");
        assert_eq!(left[0].attempts, 1);
    }

    #[tokio::test]
    async fn test_offline_flush_keeps_everything() {
        let t = transport();
        t.set_online(false);
        let q = DeferredWriteQueue::new(t.clone());
        q.enqueue(PendingWrite::new(OUTBOX, json!({"text": "hi"}))).unwrap();

        let report = q.flush_all().await;
        assert!(!report.is_clean());
        assert_eq!(q.len(), 1);

        t.set_online(true);
        assert!(q.flush_all().await.is_clean());
        assert!(q.is_empty());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let q = DeferredWriteQueue::new(transport());
        assert!(q.enqueue(PendingWrite::new(OUTBOX, json!(1)).with_id("x")).unwrap());
        assert!(!q.enqueue(PendingWrite::new(OUTBOX, json!(2)).with_id("x")).unwrap());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_unreplayable_item_is_rejected_at_enqueue() {
        let q = DeferredWriteQueue::new(transport());
        let err = q.enqueue(PendingWrite::new("not a url", json!({}))).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn test_snapshot_restore_through_json() {
        let q = DeferredWriteQueue::new(transport());
        q.enqueue(PendingWrite::new(OUTBOX, json!({"text": "a"})).with_id("a")).unwrap();
        q.enqueue(PendingWrite::new(OUTBOX, json!({"text": "b"})).with_id("b")).unwrap();
        let persisted = serde_json::to_string(&q.snapshot()).unwrap();

        let fresh = DeferredWriteQueue::new(transport());
        let items: Vec<PendingWrite> = serde_json::from_str(&persisted).unwrap();
        assert_eq!(fresh.restore(items), 2);
        let ids: Vec<String> = fresh.snapshot().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
