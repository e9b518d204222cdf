//! Bounded pool for detached side-effect tasks (hooks, mirror writes).

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

/// Spawns detached tasks, at most `limit` running at once.
///
/// The permit is acquired inside the spawned task, so [`TaskPool::spawn`]
/// never blocks the caller; excess tasks wait their turn on the runtime.
#[derive(Debug, Clone)]
pub struct TaskPool {
    label: &'static str,
    permits: Arc<Semaphore>,
}

impl TaskPool {
    #[must_use]
    pub fn new(label: &'static str, limit: usize) -> Self {
        Self {
            label,
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    /// Spawn `task` on the current runtime.
    ///
    /// Returns `false` (and drops the task) when called outside a tokio
    /// runtime.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(pool = self.label, "no runtime available, dropping task");
            return false;
        };
        let permits = Arc::clone(&self.permits);
        handle.spawn(async move {
            // the semaphore is never closed
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            task.await;
        });
        true
    }

    /// Number of tasks that could start right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn should_run_spawned_tasks() {
        let pool = TaskPool::new("test", 2);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            assert!(pool.spawn(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for _ in 0..100 {
            if counter.load(Ordering::SeqCst) == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn should_refuse_outside_runtime() {
        let pool = TaskPool::new("test", 1);
        assert!(!pool.spawn(async {}));
    }

    #[test]
    fn should_keep_at_least_one_permit() {
        assert_eq!(TaskPool::new("test", 0).available(), 1);
    }
}
