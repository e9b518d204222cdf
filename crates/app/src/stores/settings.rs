use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use vehiclehub_domain::entry::Entry;
use vehiclehub_domain::error::HubError;
use vehiclehub_domain::event::{Event, EventType};
use vehiclehub_domain::key::Key;
use vehiclehub_domain::value::Value;

use super::StoreStats;
use super::table::Table;
use crate::clock::Clock;
use crate::event_bus::InProcessEventBus;
use crate::hooks::{Change, HookHandle, HookRegistry};
use crate::ports::{SettingsDocument, SettingsPersistence};

type Slot = (Key, Key);

/// Persisted configuration, addressed by `(component, field)`.
///
/// Every successful write rewrites the whole document through the
/// persistence port before returning. The port is blocking, so saves run on
/// the blocking pool. Hooks match on the lower-cased component name.
pub struct SettingsStore<P> {
    table: Table<Slot>,
    hooks: HookRegistry,
    persistence: Arc<P>,
    // serializes document snapshots with their save
    persist_lock: Mutex<()>,
    events: Arc<InProcessEventBus>,
    clock: Arc<Clock>,
}

impl<P: SettingsPersistence + 'static> SettingsStore<P> {
    #[must_use]
    pub fn new(
        persistence: P,
        events: Arc<InProcessEventBus>,
        clock: Arc<Clock>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            table: Table::new(),
            hooks: HookRegistry::new("settings-hooks", max_concurrency),
            persistence: Arc::new(persistence),
            persist_lock: Mutex::new(()),
            events,
            clock,
        }
    }

    /// Seed the table from the persisted document. Returns how many entries
    /// were restored; invalid names are logged and skipped.
    ///
    /// # Errors
    ///
    /// Propagates the persistence error when the document cannot be read.
    pub fn load(&self) -> Result<usize, HubError> {
        let document = self.persistence.load()?;
        let at = self.clock.now();
        let mut restored = 0;
        for (component, fields) in document {
            let Ok(component_key) = Key::parse(&component) else {
                tracing::warn!(component, "skipping invalid settings component");
                continue;
            };
            for (field, value) in fields {
                let Ok(field_key) = Key::parse(&field) else {
                    tracing::warn!(component, field, "skipping invalid settings field");
                    continue;
                };
                self.table.seed(
                    (component_key.clone(), field_key.clone()),
                    Entry::restored(field_key, value.normalized(), at),
                );
                restored += 1;
            }
        }
        tracing::info!(entries = restored, "settings loaded");
        Ok(restored)
    }

    #[must_use]
    pub fn get(&self, component: &str, field: &str) -> Option<Value> {
        self.get_entry(component, field).map(|entry| entry.value)
    }

    #[must_use]
    pub fn get_entry(&self, component: &str, field: &str) -> Option<Entry> {
        let slot = (Key::parse(component).ok()?, Key::parse(field).ok()?);
        self.table.get(&slot)
    }

    #[must_use]
    pub fn get_string(&self, component: &str, field: &str, default: &str) -> String {
        self.get(component, field)
            .map_or_else(|| default.to_string(), |value| value.to_string())
    }

    #[must_use]
    pub fn get_bool(&self, component: &str, field: &str, default: bool) -> bool {
        self.get(component, field)
            .and_then(|value| value.as_bool())
            .unwrap_or(default)
    }

    /// Every field of one component, or `None` when it has none.
    #[must_use]
    pub fn get_component(&self, component: &str) -> Option<BTreeMap<Key, Entry>> {
        let component = Key::parse(component).ok()?;
        let fields: BTreeMap<Key, Entry> = self
            .table
            .filtered(|(c, _)| *c == component)
            .into_iter()
            .map(|((_, field), entry)| (field, entry))
            .collect();
        (!fields.is_empty()).then_some(fields)
    }

    /// Write one field and persist the whole table.
    ///
    /// The in-memory value is kept even when saving fails; hooks and change
    /// events fire in both cases.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] for invalid names (nothing written)
    /// and the persistence error when the document could not be saved.
    pub async fn set(
        &self,
        component: &str,
        field: &str,
        value: Value,
    ) -> Result<(Key, Key), HubError> {
        let component = Key::parse(component)?;
        let field = Key::parse(field)?;
        let (entry, _changed) = self.table.upsert(
            (component.clone(), field.clone()),
            field.clone(),
            value.normalized(),
            self.clock.now(),
            false,
        );
        let saved = self.flush().await;

        let change = Change {
            name: format!("{component}.{field}"),
            entry,
        };
        self.hooks.run(&component.hook_key(), &change);
        self.events.publish(Event::from_entry(
            EventType::SettingChanged,
            change.name,
            &change.entry,
        ));

        saved?;
        Ok((component, field))
    }

    /// Write the current table through the persistence port.
    ///
    /// # Errors
    ///
    /// Propagates the persistence error.
    pub async fn flush(&self) -> Result<(), HubError> {
        let _guard = self.persist_lock.lock().await;
        let document = self.document();
        let persistence = Arc::clone(&self.persistence);
        tokio::task::spawn_blocking(move || persistence.save(&document))
            .await
            .map_err(HubError::storage)
            .and_then(|saved| saved)
            .inspect_err(|err| {
                tracing::error!(error = %err, "unable to persist settings");
            })
    }

    /// The table in its persisted shape.
    #[must_use]
    pub fn document(&self) -> SettingsDocument {
        let mut document = SettingsDocument::new();
        for ((component, field), entry) in self.table.snapshot() {
            document
                .entry(component.to_string())
                .or_default()
                .insert(field.to_string(), entry.value);
        }
        document
    }

    /// Every entry, grouped by component.
    #[must_use]
    pub fn get_all(&self) -> BTreeMap<Key, BTreeMap<Key, Entry>> {
        let mut all: BTreeMap<Key, BTreeMap<Key, Entry>> = BTreeMap::new();
        for ((component, field), entry) in self.table.snapshot() {
            all.entry(component).or_default().insert(field, entry);
        }
        all
    }

    /// Every value, grouped by component.
    #[must_use]
    pub fn get_all_min(&self) -> SettingsDocument {
        self.document()
    }

    pub fn register_hook<F, Fut>(&self, component: &str, callback: F) -> HookHandle
    where
        F: Fn(Change) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), HubError>> + Send + 'static,
    {
        self.hooks.register(component, callback)
    }

    pub fn unregister_hook(&self, handle: HookHandle) -> bool {
        self.hooks.unregister(handle)
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
