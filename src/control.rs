//! Control channel between the host application and the proxy.
//!
//! Wire form (JSON):
//!
//! | In | Out |
//! |----|-----|
//! | `{"type":"IDENTIFY"}` | `{"generationId":"v2"}` |
//! | `{"type":"TAKE_OVER_NOW"}` | `{"activated":true,"generationId":"v2"}` |

use crate::lifecycle::LifecycleManager;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    TakeOverNow,
    Identify,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlReply {
    // Listed first: untagged deserialization tries variants in order.
    TakeOver {
        activated: bool,
        #[serde(rename = "generationId")]
        generation_id: String,
    },
    Identity {
        #[serde(rename = "generationId")]
        generation_id: String,
    },
}

impl ControlReply {
    pub fn generation_id(&self) -> &str {
        match self {
            ControlReply::TakeOver { generation_id, .. }
            | ControlReply::Identity { generation_id } => generation_id,
        }
    }
}

pub struct ControlChannel {
    lifecycle: Arc<LifecycleManager>,
}

impl ControlChannel {
    pub fn new(lifecycle: Arc<LifecycleManager>) -> Self {
        Self { lifecycle }
    }

    pub async fn handle(&self, message: ControlMessage) -> Result<ControlReply> {
        debug!(?message, generation = %self.lifecycle.generation().id, "control message");
        match message {
            ControlMessage::Identify => Ok(self.identify()),
            ControlMessage::TakeOverNow => self.takeover().await,
        }
    }

    /// Parse, dispatch and serialize in one step.
    pub async fn handle_json(&self, raw: &str) -> Result<String> {
        let message: ControlMessage = serde_json::from_str(raw).map_err(|e| {
            Error::validation_with_context(
                "unrecognized control message",
                ErrorContext::new()
                    .with_field_path("type")
                    .with_details(e.to_string())
                    .with_source("control"),
            )
        })?;
        let reply = self.handle(message).await?;
        Ok(serde_json::to_string(&reply)?)
    }

    /// Id of the generation currently controlling traffic, falling back to
    /// this channel's own generation when none is attached.
    pub fn identify(&self) -> ControlReply {
        let generation_id = self
            .lifecycle
            .controller()
            .current()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| self.lifecycle.generation().id.clone());
        ControlReply::Identity { generation_id }
    }

    pub async fn takeover(&self) -> Result<ControlReply> {
        let activated = self.lifecycle.takeover().await?;
        if activated {
            info!(generation = %self.lifecycle.generation().id, "took over via control channel");
        }
        Ok(ControlReply::TakeOver {
            activated,
            generation_id: self.lifecycle.generation().id.clone(),
        })
    }
}
