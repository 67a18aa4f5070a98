use crate::cache::CacheManager;
use crate::lifecycle::Generation;
use crate::transport::Transport;
use crate::types::{ProxyRequest, ProxyResponse};
use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Everything an executor needs, cheap to clone into background tasks.
#[derive(Clone)]
pub struct ExecutionContext {
    pub cache: Arc<CacheManager>,
    pub transport: Arc<dyn Transport>,
    pub generation: Generation,
    background: TaskTracker,
}

impl ExecutionContext {
    pub fn new(cache: Arc<CacheManager>, transport: Arc<dyn Transport>, generation: Generation) -> Self {
        Self {
            cache,
            transport,
            generation,
            background: TaskTracker::new(),
        }
    }

    /// Fetch from the network, treating 5xx as a failure.
    pub async fn fetch_network(&self, request: &ProxyRequest) -> Result<ProxyResponse> {
        let response = self.transport.fetch(request).await?;
        if response.is_server_error() {
            return Err(Error::Upstream {
                status: response.status,
                url: request.url.to_string(),
            });
        }
        Ok(response)
    }

    /// Run `task` detached from the request path. It is tracked only so that
    /// [`settle`](Self::settle) can wait for it.
    pub fn spawn_background<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.background.spawn(task)
    }

    pub fn background_in_flight(&self) -> usize {
        self.background.len()
    }

    /// Wait until every background task spawned so far has finished.
    pub async fn settle(&self) {
        self.background.close();
        self.background.wait().await;
        self.background.reopen();
    }
}
