use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use vehiclehub_domain::entry::Entry;
use vehiclehub_domain::key::Key;
use vehiclehub_domain::time::Timestamp;
use vehiclehub_domain::value::Value;

/// Ordered map of entries behind one reader-writer lock.
///
/// Entries are created on first write and never removed.
pub(crate) struct Table<K> {
    entries: RwLock<BTreeMap<K, Entry>>,
    total_writes: AtomicU64,
}

impl<K: Ord + Clone> Table<K> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            total_writes: AtomicU64::new(0),
        }
    }

    /// Insert or update. Returns a copy of the stored entry and whether the
    /// value changed (a first write counts as a change).
    pub(crate) fn upsert(
        &self,
        slot: K,
        key: Key,
        value: Value,
        at: Timestamp,
        quiet: bool,
    ) -> (Entry, bool) {
        let mut entries = self.entries.write();
        let result = match entries.get_mut(&slot) {
            Some(entry) => {
                let changed = entry.record(value, at, quiet);
                (entry.clone(), changed)
            }
            None => {
                let entry = Entry::new(key, value, at, quiet);
                entries.insert(slot, entry.clone());
                (entry, true)
            }
        };
        drop(entries);
        self.total_writes.fetch_add(1, Ordering::Relaxed);
        result
    }

    /// Seed an entry from persisted state without counting a write.
    pub(crate) fn seed(&self, slot: K, entry: Entry) {
        self.entries.write().insert(slot, entry);
    }

    pub(crate) fn get(&self, slot: &K) -> Option<Entry> {
        self.entries.read().get(slot).cloned()
    }

    /// Copy of every entry, in key order.
    pub(crate) fn snapshot(&self) -> BTreeMap<K, Entry> {
        self.entries.read().clone()
    }

    /// Copy of the entries whose slot satisfies `filter`.
    pub(crate) fn filtered(&self, filter: impl Fn(&K) -> bool) -> BTreeMap<K, Entry> {
        self.entries
            .read()
            .iter()
            .filter(|(slot, _)| filter(slot))
            .map(|(slot, entry)| (slot.clone(), entry.clone()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub(crate) fn total_writes(&self) -> u64 {
        self.total_writes.load(Ordering::Relaxed)
    }
}
