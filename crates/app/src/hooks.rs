//! Hook registry — callbacks fired when a table entry is written.
//!
//! Each table owns one registry. Hooks match on a lower-cased key (the empty
//! key matches every write). Dispatch snapshots the matching callbacks under
//! the registry lock, then launches each one as an independent task on a
//! bounded [`TaskPool`]; no ordering is guaranteed between hooks.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use vehiclehub_domain::entry::Entry;
use vehiclehub_domain::error::HubError;
use vehiclehub_domain::id::HookId;

use crate::tasks::TaskPool;

/// What a hook receives.
#[derive(Debug, Clone)]
pub struct Change {
    /// `KEY` for session writes, `COMPONENT.FIELD` for settings writes.
    pub name: String,
    /// The entry as it was right after the write.
    pub entry: Entry,
}

type HookFuture = Pin<Box<dyn Future<Output = Result<(), HubError>> + Send>>;
type Callback = Arc<dyn Fn(Change) -> HookFuture + Send + Sync>;

/// Returned by [`HookRegistry::register`]; pass it back to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(HookId);

struct Hook {
    id: HookId,
    match_key: String,
    callback: Callback,
}

/// Per-table hook list plus dispatch counters.
pub struct HookRegistry {
    hooks: Mutex<Vec<Hook>>,
    pool: TaskPool,
    fired: AtomicU64,
    failures: Arc<AtomicU64>,
}

impl HookRegistry {
    #[must_use]
    pub fn new(label: &'static str, max_concurrency: usize) -> Self {
        Self {
            hooks: Mutex::new(Vec::new()),
            pool: TaskPool::new(label, max_concurrency),
            fired: AtomicU64::new(0),
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register `callback` for writes to `key` (`""` for every write).
    ///
    /// The key is matched case-insensitively, with spaces treated as
    /// underscores.
    pub fn register<F, Fut>(&self, key: &str, callback: F) -> HookHandle
    where
        F: Fn(Change) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HubError>> + Send + 'static,
    {
        let id = HookId::new();
        let callback: Callback = Arc::new(move |change| Box::pin(callback(change)));
        self.hooks.lock().push(Hook {
            id,
            match_key: match_key(key),
            callback,
        });
        HookHandle(id)
    }

    /// Remove a hook. Returns `false` when it was already gone.
    ///
    /// Invocations already dispatched still run to completion.
    pub fn unregister(&self, handle: HookHandle) -> bool {
        let mut hooks = self.hooks.lock();
        let before = hooks.len();
        hooks.retain(|hook| hook.id != handle.0);
        hooks.len() != before
    }

    /// Dispatch `change` to every hook matching `key`. Returns how many were
    /// launched.
    pub fn run(&self, key: &str, change: &Change) -> usize {
        let matching: Vec<Callback> = {
            let hooks = self.hooks.lock();
            hooks
                .iter()
                .filter(|hook| hook.match_key.is_empty() || hook.match_key == key)
                .map(|hook| Arc::clone(&hook.callback))
                .collect()
        };

        let mut launched = 0;
        for callback in matching {
            let change = change.clone();
            let failures = Arc::clone(&self.failures);
            let started = self.pool.spawn(async move {
                let name = change.name.clone();
                if let Err(err) = callback(change).await {
                    failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key = %name, error = %err, "hook failed");
                }
            });
            if started {
                launched += 1;
            }
        }
        self.fired.fetch_add(launched as u64, Ordering::Relaxed);
        launched
    }

    /// Number of registered hooks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total hook invocations launched.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Total hook invocations that returned an error.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

fn match_key(raw: &str) -> String {
    raw.trim().replace(' ', "_").to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vehiclehub_domain::error::ValidationError;
    use vehiclehub_domain::key::Key;
    use vehiclehub_domain::time::{now, utc};
    use vehiclehub_domain::value::Value;

    fn change(key: &str) -> Change {
        let key = Key::parse(key).unwrap();
        Change {
            name: key.to_string(),
            entry: Entry::new(key, Value::Bool(true), now(utc()), false),
        }
    }

    async fn wait_for(counter: &AtomicU64, expected: u64) {
        for _ in 0..200 {
            if counter.load(Ordering::SeqCst) >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    fn counting_hook(registry: &HookRegistry, key: &str) -> (HookHandle, Arc<AtomicU64>) {
        let counter = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&counter);
        let handle = registry.register(key, move |_change| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        (handle, counter)
    }

    #[tokio::test]
    async fn should_fire_matching_hook_once() {
        let registry = HookRegistry::new("test", 4);
        let (_, counter) = counting_hook(&registry, "Key State");

        assert_eq!(registry.run("key_state", &change("key_state")), 1);
        assert_eq!(registry.run("acc_power", &change("acc_power")), 0);

        wait_for(&counter, 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(registry.fired(), 1);
    }

    #[tokio::test]
    async fn should_fire_catch_all_hook_for_every_key() {
        let registry = HookRegistry::new("test", 4);
        let (_, counter) = counting_hook(&registry, "");

        registry.run("key_state", &change("key_state"));
        registry.run("acc_power", &change("acc_power"));

        wait_for(&counter, 2).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn should_stop_firing_after_unregister() {
        let registry = HookRegistry::new("test", 4);
        let (handle, counter) = counting_hook(&registry, "acc_power");

        assert!(registry.unregister(handle));
        assert!(!registry.unregister(handle));
        assert_eq!(registry.run("acc_power", &change("acc_power")), 0);
        assert!(registry.is_empty());
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_count_failed_hooks() {
        let registry = HookRegistry::new("test", 4);
        registry.register("acc_power", |_change| async {
            Err(HubError::from(ValidationError::EmptyName))
        });

        registry.run("acc_power", &change("acc_power"));

        for _ in 0..200 {
            if registry.failures() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(registry.failures(), 1);
    }
}
