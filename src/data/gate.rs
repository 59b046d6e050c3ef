//! API gate — routes tasks by join state and connectivity.
//!
//! DESIGN
//! ======
//! `route` is the single state check:
//!
//! - `Immediate` tasks execute.
//! - `GatedOnNetwork` tasks execute when online, else wait in the network
//!   queue.
//! - `GatedOnJoin` tasks wait in the join queue until the account is joined,
//!   then behave like `GatedOnNetwork`.
//!
//! A task that fails when executed directly is handed to the network queue,
//! which spends the rest of its retry budget. An unreachable server takes
//! connectivity offline first, so the task waits there.
//!
//! `join` flips the joined flag after a successful `users.join` and
//! re-dispatches every task parked in the join queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;

use crate::api::{Joiner, PicturesqueApi};
use crate::error::SyncError;
use crate::event_log::EventLog;
use crate::offline::NetworkQueue;
use crate::utils::queue::{Failed, run_task};
use crate::utils::{RoutingPolicy, Task, TaskQueue};

/// Where a dispatched task goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    JoinQueue,
    NetworkQueue,
    Execute,
}

struct GateInner {
    joined: AtomicBool,
    join_queue: TaskQueue,
    network: NetworkQueue,
    api: PicturesqueApi,
    task_tries: u32,
    log: EventLog,
}

#[derive(Clone)]
pub struct ApiGate {
    inner: Arc<GateInner>,
}

impl ApiGate {
    #[must_use]
    pub fn new(api: PicturesqueApi, network: NetworkQueue, task_tries: u32, log: EventLog) -> Self {
        Self {
            inner: Arc::new(GateInner {
                joined: AtomicBool::new(false),
                join_queue: TaskQueue::new(log.clone()),
                network,
                api,
                task_tries,
                log,
            }),
        }
    }

    #[must_use]
    pub fn is_joined(&self) -> bool {
        self.inner.joined.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn join_queue(&self) -> &TaskQueue {
        &self.inner.join_queue
    }

    #[must_use]
    pub fn network(&self) -> &NetworkQueue {
        &self.inner.network
    }

    #[must_use]
    pub fn api(&self) -> &PicturesqueApi {
        &self.inner.api
    }

    #[must_use]
    pub fn task_tries(&self) -> u32 {
        self.inner.task_tries
    }

    // =========================================================================
    // ROUTING
    // =========================================================================

    #[must_use]
    pub fn route(&self, policy: RoutingPolicy) -> Route {
        let online = self.inner.network.connectivity().is_online();
        match policy {
            RoutingPolicy::Immediate => Route::Execute,
            RoutingPolicy::GatedOnJoin if !self.is_joined() => Route::JoinQueue,
            RoutingPolicy::GatedOnNetwork | RoutingPolicy::GatedOnJoin if online => Route::Execute,
            RoutingPolicy::GatedOnNetwork | RoutingPolicy::GatedOnJoin => Route::NetworkQueue,
        }
    }

    pub async fn dispatch(&self, task: Task) {
        match self.route(task.policy()) {
            Route::JoinQueue => {
                self.inner.log.info(format!("waiting for join: {}", task.label()));
                self.inner.join_queue.push(task);
            }
            Route::NetworkQueue => self.inner.network.add(task).await,
            Route::Execute => {
                if let Err(Failed { task, error }) = run_task(task).await {
                    self.inner.log.error(format!("{} failed, handing to network queue: {error}", task.label()));
                    self.inner.network.observe_failure(&error);
                    self.inner.network.add(task).await;
                }
            }
        }
    }

    // =========================================================================
    // JOIN
    // =========================================================================

    /// Join the signed-in account, then release every join-gated task.
    pub async fn join(&self) {
        if self.is_joined() {
            self.consume_join_queue().await;
            return;
        }

        let gate = self.clone();
        let task = Task::new("users.join", move || {
            let gate = gate.clone();
            async move {
                gate.inner.api.join().await?;
                gate.inner.joined.store(true, Ordering::SeqCst);
                gate.inner.log.info("joined");
                gate.consume_join_queue().await;
                Ok::<(), SyncError>(())
            }
            .boxed()
        })
        .with_policy(RoutingPolicy::GatedOnNetwork)
        .with_tries(self.inner.task_tries);

        self.dispatch(task).await;
    }

    /// Re-dispatch every task parked while the account was not joined.
    pub async fn consume_join_queue(&self) {
        if !self.is_joined() {
            self.inner.log.error("join queue consumed before join");
            return;
        }
        self.inner
            .join_queue
            .consume_with(|task| {
                let gate = self.clone();
                async move {
                    gate.dispatch(task).await;
                    Ok::<(), Failed>(())
                }
            })
            .await;
    }
}

#[async_trait::async_trait]
impl Joiner for ApiGate {
    async fn join(&self) {
        ApiGate::join(self).await;
    }
}

#[cfg(test)]
#[path = "gate_test.rs"]
mod tests;
