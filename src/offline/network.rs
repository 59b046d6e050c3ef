//! Network queue — a task queue that only drains while online.
//!
//! DESIGN
//! ======
//! `NetworkQueue` composes a `TaskQueue` with a `Connectivity` handle. The
//! drain loop checks connectivity before every step; going offline stops the
//! drain and clears `started`. `spawn_online_listener` restarts draining
//! when connectivity comes back and fires any registered on-online
//! callbacks.
//!
//! A task that cannot reach the server marks connectivity offline, so the
//! rest of the queue waits instead of burning its retries.
//! `spawn_reconnect_timer` flips the flag back online after a fixed delay;
//! the next unreachable call takes it offline again.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::ApiError;
use crate::error::SyncError;
use crate::event_log::EventLog;
use crate::utils::queue::{Failed, run_task};
use crate::utils::{CallbackList, Task, TaskQueue};

// =============================================================================
// CONNECTIVITY
// =============================================================================

/// Shared online/offline flag with change notification.
#[derive(Clone)]
pub struct Connectivity {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl Connectivity {
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx: std::sync::Arc::new(tx) }
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Update the flag; subscribers are only notified on an actual change.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

// =============================================================================
// NETWORK QUEUE
// =============================================================================

#[derive(Clone)]
pub struct NetworkQueue {
    queue: TaskQueue,
    connectivity: Connectivity,
}

impl NetworkQueue {
    #[must_use]
    pub fn new(connectivity: Connectivity, log: EventLog) -> Self {
        Self { queue: TaskQueue::new(log), connectivity }
    }

    #[must_use]
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    #[must_use]
    pub fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Enqueue a task and try to start draining.
    pub async fn add(&self, task: Task) {
        self.queue.log().info(format!("queued for network: {}", task.label()));
        self.queue.push(task);
        self.start().await;
    }

    /// Begin draining unless a drain is already running.
    pub async fn start(&self) {
        if !self.queue.try_begin() {
            self.queue.log().info("start called when already started");
            return;
        }
        self.consume().await;
    }

    /// Drain while online; stop as soon as connectivity drops.
    pub async fn consume(&self) {
        loop {
            if !self.connectivity.is_online() {
                self.queue.stop();
                return;
            }
            if !self.queue.step_with(|task| self.attempt(task)).await {
                return;
            }
        }
    }

    async fn attempt(&self, task: Task) -> Result<(), Failed> {
        run_task(task).await.inspect_err(|failed| self.observe_failure(&failed.error))
    }

    /// Go offline when `error` shows the server could not be reached.
    pub fn observe_failure(&self, error: &SyncError) {
        if is_unreachable(error) && self.connectivity.is_online() {
            warn!(%error, "server unreachable; going offline");
            self.queue.log().error(format!("going offline: {error}"));
            self.connectivity.set_online(false);
        }
    }
}

fn is_unreachable(error: &SyncError) -> bool {
    matches!(error, SyncError::Api(ApiError::Transport(_)))
}

/// Restart the network queue whenever connectivity comes back.
pub fn spawn_online_listener(network: NetworkQueue, on_online: CallbackList) -> JoinHandle<()> {
    let mut changes = network.connectivity().subscribe();
    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let online = *changes.borrow_and_update();
            info!(online, "connectivity changed");
            if online {
                on_online.fire().await;
                network.start().await;
            }
        }
    })
}

/// Bring connectivity back online `delay` after each drop.
pub fn spawn_reconnect_timer(connectivity: Connectivity, delay: Duration) -> JoinHandle<()> {
    let mut changes = connectivity.subscribe();
    tokio::spawn(async move {
        loop {
            let dropped = changes.wait_for(|online| !*online).await.is_ok();
            if !dropped {
                return;
            }
            tokio::time::sleep(delay).await;
            info!(delay_secs = delay.as_secs(), "retrying connectivity");
            connectivity.set_online(true);
        }
    })
}

#[cfg(test)]
#[path = "network_test.rs"]
mod tests;
