use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::FixedOffset;
use tokio::sync::broadcast;

use vehiclehub_domain::entry::Entry;
use vehiclehub_domain::error::HubError;
use vehiclehub_domain::event::{Event, EventType};
use vehiclehub_domain::frame::{FrameField, decode_frame};
use vehiclehub_domain::key::Key;
use vehiclehub_domain::value::Value;

use super::table::Table;
use super::{SetOptions, StoreStats};
use crate::clock::Clock;
use crate::event_bus::InProcessEventBus;
use crate::hooks::{Change, HookHandle, HookRegistry};
use crate::ports::StateMirror;
use crate::serial::FrameSink;
use crate::tasks::TaskPool;

/// Outcome of applying one serial frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Keys written, in frame order.
    pub applied: Vec<Key>,
    /// Fields that were skipped, with the reason.
    pub rejected: Vec<(String, String)>,
}

/// Live vehicle facts. Not persisted; mirrored best-effort.
pub struct SessionStore<M> {
    table: Table<Key>,
    hooks: HookRegistry,
    mirror: Arc<M>,
    mirror_pool: TaskPool,
    events: Arc<InProcessEventBus>,
    clock: Arc<Clock>,
}

impl<M: StateMirror + 'static> SessionStore<M> {
    #[must_use]
    pub fn new(
        mirror: M,
        events: Arc<InProcessEventBus>,
        clock: Arc<Clock>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            table: Table::new(),
            hooks: HookRegistry::new("session-hooks", max_concurrency),
            mirror: Arc::new(mirror),
            mirror_pool: TaskPool::new("session-mirror", max_concurrency),
            events,
            clock,
        }
    }

    /// Current value of `key`. Invalid keys are simply absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_entry(key).map(|entry| entry.value)
    }

    #[must_use]
    pub fn get_entry(&self, key: &str) -> Option<Entry> {
        let key = Key::parse(key).ok()?;
        self.table.get(&key)
    }

    /// Read a boolean, falling back to `default` when missing or unparseable.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|value| value.as_bool())
            .unwrap_or(default)
    }

    #[must_use]
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .map_or_else(|| default.to_string(), |value| value.to_string())
    }

    #[must_use]
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|value| value.as_f64())
            .unwrap_or(default)
    }

    /// Write `value` under `key`.
    ///
    /// Hooks for the key are dispatched after the table lock is released.
    /// When `options.publish` is set and the value changed, a mirror write is
    /// spawned; its failure is logged and never reaches the caller.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] for an invalid key; the table is left
    /// untouched.
    pub fn set(&self, key: &str, value: Value, options: SetOptions) -> Result<Key, HubError> {
        let key = Key::parse(key)?;
        let (entry, changed) = self.table.upsert(
            key.clone(),
            key.clone(),
            value.normalized(),
            self.clock.now(),
            options.quiet,
        );
        tracing::trace!(key = %key, value = %entry.value, changed, "session write");

        let change = Change {
            name: key.to_string(),
            entry,
        };
        self.hooks.run(&key.hook_key(), &change);

        if options.publish && changed && !change.entry.quiet {
            self.spawn_mirror(change.entry.clone());
        }
        self.events.publish(Event::from_entry(
            EventType::SessionChanged,
            change.name,
            &change.entry,
        ));
        Ok(key)
    }

    fn spawn_mirror(&self, entry: Entry) {
        let mirror = Arc::clone(&self.mirror);
        self.mirror_pool.spawn(async move {
            if let Err(err) = mirror.mirror(&entry).await {
                tracing::warn!(key = %entry.key, error = %err, "state mirror failed");
            }
        });
    }

    /// Copy of every entry.
    #[must_use]
    pub fn get_all(&self) -> BTreeMap<Key, Entry> {
        self.table.snapshot()
    }

    /// Copy of every value, without bookkeeping.
    #[must_use]
    pub fn get_all_min(&self) -> BTreeMap<Key, Value> {
        self.table
            .snapshot()
            .into_iter()
            .map(|(key, entry)| (key, entry.value))
            .collect()
    }

    /// Decode one serial frame and write every supported field.
    ///
    /// Unsupported or invalid fields are logged and skipped; the rest of the
    /// frame is still applied.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when the frame is not a JSON object.
    pub fn ingest_frame(&self, frame: &str) -> Result<FrameReport, HubError> {
        let mut report = FrameReport::default();
        for field in decode_frame(frame)? {
            if let FrameField::Unsupported { key, reason } = &field {
                tracing::warn!(key = %key, reason, "skipping frame field");
                report.rejected.push((key.clone(), (*reason).to_string()));
                continue;
            }
            for (name, value) in field.into_assignments() {
                match self.set(&name, value, SetOptions::default()) {
                    Ok(key) => report.applied.push(key),
                    Err(err) => {
                        tracing::warn!(key = %name, error = %err, "skipping frame field");
                        report.rejected.push((name, err.to_string()));
                    }
                }
            }
        }
        Ok(report)
    }

    /// Change the timezone used for subsequent timestamps.
    pub fn set_timezone(&self, offset: FixedOffset) {
        self.clock.set_offset(offset);
        tracing::info!(offset = %offset, "session timezone updated");
    }

    pub fn register_hook<F, Fut>(&self, key: &str, callback: F) -> HookHandle
    where
        F: Fn(Change) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HubError>> + Send + 'static,
    {
        self.hooks.register(key, callback)
    }

    pub fn unregister_hook(&self, handle: HookHandle) -> bool {
        self.hooks.unregister(handle)
    }

    /// Subscribe to change events from both tables.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.table.len(),
            total_writes: self.table.total_writes(),
            hooks_registered: self.hooks.len(),
            hooks_fired: self.hooks.fired(),
            hook_failures: self.hooks.failures(),
        }
    }
}

impl<M: StateMirror + 'static> FrameSink for SessionStore<M> {
    fn ingest(&self, frame: &str) {
        match self.ingest_frame(frame) {
            Ok(report) => {
                tracing::debug!(
                    applied = report.applied.len(),
                    rejected = report.rejected.len(),
                    "frame applied"
                );
            }
            Err(err) => tracing::warn!(error = %err, frame, "dropping unparseable frame"),
        }
    }
}
