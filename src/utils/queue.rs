//! Task queue — FIFO drain with failure rotation.
//!
//! DESIGN
//! ======
//! `step` pops the head task and runs one attempt. A failed attempt moves the
//! task to the tail, so other tasks may overtake it; draining continues until
//! the queue is empty, which clears the `started` flag. Retry limits live in
//! the task itself, so a permanently failing task drops out once its budget
//! is spent.
//!
//! The lock is held only to pop or push; task attempts run unlocked, which
//! lets a running task push into the queue that is draining it.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ErrorCode, SyncError};
use crate::event_log::EventLog;

use super::task::Task;

/// A task whose attempt failed, handed back for requeueing.
pub struct Failed {
    pub task: Task,
    pub error: SyncError,
}

#[derive(Default)]
struct QueueState {
    tasks: VecDeque<Task>,
    started: bool,
}

#[derive(Clone)]
pub struct TaskQueue {
    state: Arc<Mutex<QueueState>>,
    log: EventLog,
}

impl TaskQueue {
    #[must_use]
    pub fn new(log: EventLog) -> Self {
        Self { state: Arc::new(Mutex::new(QueueState::default())), log }
    }

    #[must_use]
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Append a task without starting a drain.
    pub fn push(&self, task: Task) {
        self.lock().tasks.push_back(task);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.lock().started
    }

    /// Labels of queued tasks, head first.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.lock().tasks.iter().map(|t| t.label().to_owned()).collect()
    }

    /// Mark the queue as not draining.
    pub fn stop(&self) {
        self.lock().started = false;
    }

    /// Claim the `started` flag. Returns `false` if a drain is already running.
    pub fn try_begin(&self) -> bool {
        let mut state = self.lock();
        if state.started {
            return false;
        }
        state.started = true;
        true
    }

    /// Begin draining unless a drain is already in progress.
    pub async fn start(&self) {
        if !self.try_begin() {
            self.log.info("start called when already started");
            return;
        }
        self.consume().await;
    }

    /// Drain until empty, running each task directly.
    pub async fn consume(&self) {
        self.consume_with(run_task).await;
    }

    /// Drain until empty using a custom per-task step.
    pub async fn consume_with<F, Fut>(&self, mut run: F)
    where
        F: FnMut(Task) -> Fut,
        Fut: Future<Output = Result<(), Failed>>,
    {
        while self.step_with(&mut run).await {}
    }

    /// Run one attempt of the head task. Returns `false` once the queue is empty.
    pub async fn step(&self) -> bool {
        self.step_with(run_task).await
    }

    pub async fn step_with<F, Fut>(&self, run: F) -> bool
    where
        F: FnOnce(Task) -> Fut,
        Fut: Future<Output = Result<(), Failed>>,
    {
        let Some(task) = self.pop_or_stop() else {
            return false;
        };

        if let Err(failed) = run(task).await {
            self.requeue(failed);
        }
        true
    }

    fn pop_or_stop(&self) -> Option<Task> {
        let mut state = self.lock();
        let task = state.tasks.pop_front();
        state.started = task.is_some();
        task
    }

    fn requeue(&self, failed: Failed) {
        let Failed { task, error } = failed;
        self.log.error(format!(
            "consume error: {} failed ({}, {} tries left): {error}",
            task.label(),
            error.error_code(),
            task.tries_remaining()
        ));
        self.push(task);
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Default step: one attempt of the task, handing it back on failure.
pub async fn run_task(mut task: Task) -> Result<(), Failed> {
    match task.call().await {
        Ok(()) => Ok(()),
        Err(error) => Err(Failed { task, error }),
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
