//! Tracks detached async-step tasks.
//!
//! Async steps outlive the run that started them. The supervisor only
//! exists so that runtime shutdown can cancel whatever is still in flight.

use parking_lot::Mutex;
use std::future::Future;
use tokio::task::JoinSet;
use tracing::debug;

#[derive(Default)]
pub struct TaskSupervisor {
    tasks: Mutex<JoinSet<()>>,
}

impl TaskSupervisor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Detaches `task`. Finished tasks are reaped on each call.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Tasks not yet reaped.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut tasks = self.tasks.lock();
        while tasks.try_join_next().is_some() {}
        tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancels every outstanding task.
    pub fn abort_all(&self) {
        let mut tasks = self.tasks.lock();
        let outstanding = tasks.len();
        tasks.abort_all();
        // aborted tasks are dropped with the set
        *tasks = JoinSet::new();
        debug!(outstanding, "Async steps cancelled");
    }
}
