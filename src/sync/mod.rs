//! 延迟写入模块：离线期间排队的写操作，在网络恢复后重放。
//!
//! # Deferred Write Queue Module
//!
//! Application writes made while offline (e.g. queued outbound messages) are
//! held here and replayed through the transport once connectivity returns.
//!
//! ## Overview
//!
//! - Replay is FIFO over the items present when the flush starts
//! - A failed item stays queued and the flush moves on to the next one
//! - Items are removed only after a 2xx replay
//! - Only one flush runs at a time
//! - Persistence across restarts is left to the host via
//!   [`DeferredWriteQueue::snapshot`] / [`DeferredWriteQueue::restore`]
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PendingWrite`] | One queued write with a stable id |
//! | [`DeferredWriteQueue`] | The queue and its flush |
//! | [`FlushReport`] | Ids that replayed and ids that stay queued |
//! | [`ConnectivityMonitor`] | Online/offline signal (tokio `watch`) |
//! | [`spawn_replay_on_reconnect`] | Flushes on every offline→online edge |

mod connectivity;
mod queue;

pub use connectivity::{spawn_replay_on_reconnect, ConnectivityMonitor};
pub use queue::{DeferredWriteQueue, FlushReport, PendingWrite};
