//! Task — a deferred, retryable unit of work.
//!
//! DESIGN
//! ======
//! A task captures its arguments in an action closure at construction. Each
//! `call` spends one attempt; once the budget is gone the task no-ops
//! forever, so a queue that keeps re-appending a failing task still
//! terminates. How a task is routed (run now, wait for network, wait for
//! join) is data on the task, not a subtype: see [`RoutingPolicy`].

use std::fmt;

use futures::future::BoxFuture;
use tracing::debug;

use crate::config::DEFAULT_TASK_TRIES;
use crate::error::SyncError;

/// Future produced by one attempt of a task's action.
pub type TaskFuture = BoxFuture<'static, Result<(), SyncError>>;

type Action = Box<dyn FnMut() -> TaskFuture + Send>;

/// Gates a task must pass before it executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingPolicy {
    /// Run as soon as dispatched.
    Immediate,
    /// Wait for connectivity.
    GatedOnNetwork,
    /// Wait for a joined account, then for connectivity.
    GatedOnJoin,
}

pub struct Task {
    label: String,
    policy: RoutingPolicy,
    tries_remaining: u32,
    action: Action,
}

impl Task {
    /// Create an immediate task with the default retry budget.
    pub fn new<F>(label: impl Into<String>, action: F) -> Self
    where
        F: FnMut() -> TaskFuture + Send + 'static,
    {
        Self {
            label: label.into(),
            policy: RoutingPolicy::Immediate,
            tries_remaining: DEFAULT_TASK_TRIES,
            action: Box::new(action),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries_remaining = tries;
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    #[must_use]
    pub fn tries_remaining(&self) -> u32 {
        self.tries_remaining
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.tries_remaining == 0
    }

    /// Run one attempt of the action.
    ///
    /// An exhausted task returns `Ok(())` without running the action.
    ///
    /// # Errors
    ///
    /// Returns whatever the action reports for this attempt.
    pub async fn call(&mut self) -> Result<(), SyncError> {
        if self.tries_remaining == 0 {
            debug!(task = %self.label, "task retry budget exhausted; skipping");
            return Ok(());
        }

        self.tries_remaining -= 1;
        (self.action)().await
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .field("policy", &self.policy)
            .field("tries_remaining", &self.tries_remaining)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "task_test.rs"]
mod tests;
