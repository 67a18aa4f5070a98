//! 生命周期模块：缓存代际的安装、等待、激活与旧代际清理。
//!
//! # Lifecycle Manager Module
//!
//! Explicit state machine for one cache generation:
//!
//! ```text
//! Pending ──install──▶ Installing ──ok──▶ Waiting ──activate/takeover──▶ Activating ──▶ Active
//!    ▲                     │                                                   │
//!    └────────fail─────────┘                       another generation claims ──┴──▶ Redundant
//! ```
//!
//! - **Install** pre-caches the asset manifest into the static store,
//!   all-or-nothing: every asset is fetched before anything is written, and a
//!   failed write rolls back what was written.
//! - **Activate** deletes every store not named by this generation and claims
//!   the shared [`ControllerSlot`].
//! - A freshly installed generation activates on its own only when no
//!   generation controls traffic; otherwise it waits for a takeover, or for
//!   the controller to [`detach`](LifecycleManager::detach).
//! - A `Redundant` generation is finished: it never activates again.

mod generation;

pub use generation::{ControllerSlot, Generation};

use crate::cache::{CacheKey, CacheRegistry, CachedResponse};
use crate::transport::Transport;
use crate::types::ProxyRequest;
use crate::{Error, ErrorContext, Result};
use futures::future::try_join_all;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Not installed yet, or the last install failed.
    Pending,
    Installing,
    /// Installed while another generation controls traffic.
    Waiting,
    Activating,
    Active,
    /// Was active; another generation has since claimed control.
    Redundant,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// No controller was attached, so the generation activated immediately.
    Activated(CleanupReport),
    Waiting,
}

pub struct LifecycleManager {
    generation: Generation,
    manifest: Vec<Url>,
    registry: Arc<dyn CacheRegistry>,
    transport: Arc<dyn Transport>,
    controller: Arc<ControllerSlot>,
    state: Mutex<LifecycleState>,
}

impl LifecycleManager {
    pub fn new(
        generation: Generation,
        manifest: Vec<Url>,
        registry: Arc<dyn CacheRegistry>,
        transport: Arc<dyn Transport>,
        controller: Arc<ControllerSlot>,
    ) -> Self {
        Self {
            generation,
            manifest,
            registry,
            transport,
            controller,
            state: Mutex::new(LifecycleState::Pending),
        }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn manifest(&self) -> &[Url] {
        &self.manifest
    }

    pub fn controller(&self) -> &Arc<ControllerSlot> {
        &self.controller
    }

    pub fn state(&self) -> LifecycleState {
        let mut state = self.lock_state();
        self.observe_displacement(&mut state)
    }

    /// True when this generation should handle intercepted requests.
    pub fn is_controlling(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    pub async fn install(&self) -> Result<InstallOutcome> {
        {
            let mut state = self.lock_state();
            if *state != LifecycleState::Pending {
                return Err(self.invalid_transition("install", *state));
            }
            *state = LifecycleState::Installing;
        }
        info!(generation = %self.generation.id, assets = self.manifest.len(), "installing");

        if let Err(e) = self.precache().await {
            self.set_state(LifecycleState::Pending);
            warn!(generation = %self.generation.id, error = %e, "install failed");
            return Err(e);
        }
        self.set_state(LifecycleState::Waiting);

        if self.controller.is_attached() {
            info!(generation = %self.generation.id, "installed, waiting for takeover");
            Ok(InstallOutcome::Waiting)
        } else {
            Ok(InstallOutcome::Activated(self.activate().await?))
        }
    }

    /// Activate a waiting generation. Re-running on an active generation
    /// repeats the cleanup; a displaced generation is rejected.
    pub async fn activate(&self) -> Result<CleanupReport> {
        let previous = {
            let mut state = self.lock_state();
            match self.observe_displacement(&mut state) {
                LifecycleState::Waiting | LifecycleState::Active => {}
                other => return Err(self.invalid_transition("activate", other)),
            }
            std::mem::replace(&mut *state, LifecycleState::Activating)
        };

        let report = match self.cleanup().await {
            Ok(report) => report,
            Err(e) => {
                self.set_state(previous);
                return Err(e);
            }
        };
        let replaced = self.controller.claim(&self.generation.id);
        self.set_state(LifecycleState::Active);
        info!(
            generation = %self.generation.id,
            replaced = replaced.as_deref().map(String::as_str).unwrap_or("-"),
            deleted = ?report.deleted,
            "activated"
        );
        Ok(report)
    }

    /// Activate now if waiting. Returns whether an activation happened.
    pub async fn takeover(&self) -> Result<bool> {
        match self.state() {
            LifecycleState::Waiting => {
                self.activate().await?;
                Ok(true)
            }
            other => {
                info!(generation = %self.generation.id, state = ?other, "takeover ignored");
                Ok(false)
            }
        }
    }

    /// Activate a waiting generation when nothing controls traffic. Returns
    /// `None` when the generation is not waiting or a controller is attached.
    pub async fn activate_if_unattached(&self) -> Result<Option<CleanupReport>> {
        if self.state() != LifecycleState::Waiting || self.controller.is_attached() {
            return Ok(None);
        }
        info!(generation = %self.generation.id, "no controller attached, activating");
        self.activate().await.map(Some)
    }

    /// Give up control of traffic. Only the controlling generation can detach;
    /// it becomes `Redundant` and a waiting generation may then activate.
    pub fn detach(&self) -> bool {
        let mut state = self.lock_state();
        if self.observe_displacement(&mut state) != LifecycleState::Active {
            return false;
        }
        if !self.controller.release_if(&self.generation.id) {
            return false;
        }
        *state = LifecycleState::Redundant;
        info!(generation = %self.generation.id, "detached");
        true
    }

    /// Delete every store this generation does not name.
    pub async fn cleanup(&self) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        for name in self.registry.store_names().await? {
            if self.generation.owns(&name) {
                report.kept.push(name);
            } else if self.registry.delete_store(&name).await? {
                report.deleted.push(name);
            }
        }
        Ok(report)
    }

    async fn precache(&self) -> Result<usize> {
        let store = self.generation.static_store.as_str();
        let existed = self.registry.has_store(store).await?;

        let fetches = self.manifest.iter().map(|url| async move {
            let request = ProxyRequest::new(reqwest::Method::GET, url.clone());
            let response = self.transport.fetch(&request).await.map_err(|e| Error::Install {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            if !response.is_success() {
                return Err(Error::Install {
                    url: url.to_string(),
                    reason: format!("HTTP {}", response.status),
                });
            }
            Ok((request.cache_key(), response))
        });
        let fetched = try_join_all(fetches).await?;

        self.registry.open(store).await?;
        // (key, entry it replaced) for every write, so a rollback can restore.
        let mut written: Vec<(CacheKey, Option<CachedResponse>)> =
            Vec::with_capacity(fetched.len());
        for (key, response) in &fetched {
            let replaced = if existed {
                self.registry.match_in(store, key).await?
            } else {
                None
            };
            if let Err(e) = self
                .registry
                .put(store, key, CachedResponse::snapshot(response))
                .await
            {
                self.rollback(existed, written).await;
                return Err(Error::Install {
                    url: key.url.clone(),
                    reason: e.to_string(),
                });
            }
            written.push((key.clone(), replaced));
        }
        Ok(written.len())
    }

    async fn rollback(
        &self,
        store_existed: bool,
        written: Vec<(CacheKey, Option<CachedResponse>)>,
    ) {
        let store = self.generation.static_store.as_str();
        if !store_existed {
            if let Err(e) = self.registry.delete_store(store).await {
                warn!(store, error = %e, "rollback could not drop static store");
            }
            return;
        }
        for (key, replaced) in written.into_iter().rev() {
            let restored = match replaced {
                Some(previous) => self.registry.put(store, &key, previous).await,
                None => self.registry.delete(store, &key).await.map(|_| ()),
            };
            if let Err(e) = restored {
                warn!(store, %key, error = %e, "rollback could not restore entry");
            }
        }
    }

    /// An `Active` generation whose slot was claimed by another is recorded
    /// as `Redundant` so it can never activate again.
    fn observe_displacement(&self, state: &mut LifecycleState) -> LifecycleState {
        if *state == LifecycleState::Active && !self.controller.is(&self.generation.id) {
            *state = LifecycleState::Redundant;
        }
        *state
    }

    fn lock_state(&self) -> MutexGuard<'_, LifecycleState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, next: LifecycleState) {
        *self.lock_state() = next;
    }

    fn invalid_transition(&self, action: &str, state: LifecycleState) -> Error {
        Error::runtime_with_context(
            format!("cannot {} generation '{}'", action, self.generation.id),
            ErrorContext::new()
                .with_details(format!("state is {:?}", state))
                .with_source("lifecycle"),
        )
    }
}
