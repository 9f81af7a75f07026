//! Per-client request windows.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::decision::prune;

/// Mapping from client key to the timestamps of its admitted requests.
///
/// Backed by a sharded map: a read-modify-write on one key holds that key's
/// shard lock, so updates to the same key are serialized while unrelated keys
/// proceed in parallel. Empty windows are never stored.
#[derive(Debug, Default)]
pub struct WindowStore {
    entries: DashMap<String, Vec<u64>>,
}

impl WindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the key's timestamps, empty if the key is not tracked.
    pub fn get(&self, key: &str) -> Vec<u64> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Replace the key's timestamps. An empty sequence removes the key.
    pub fn set(&self, key: &str, timestamps: Vec<u64>) {
        if timestamps.is_empty() {
            self.entries.remove(key);
        } else {
            self.entries.insert(key.to_string(), timestamps);
        }
    }

    /// Run `f` on the key's window while holding the key's lock.
    ///
    /// The entry is only inserted if `f` leaves it non-empty and is removed if
    /// `f` empties it, all before the lock is released.
    pub fn update<R>(&self, key: &str, f: impl FnOnce(&mut Vec<u64>) -> R) -> R {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let result = f(occupied.get_mut());
                if occupied.get().is_empty() {
                    occupied.remove();
                }
                result
            }
            Entry::Vacant(vacant) => {
                let mut timestamps = Vec::new();
                let result = f(&mut timestamps);
                if !timestamps.is_empty() {
                    vacant.insert(timestamps);
                }
                result
            }
        }
    }

    /// Visit a snapshot of every entry. The visitor may freely mutate the store.
    pub fn for_each(&self, mut visit: impl FnMut(&str, &[u64])) {
        let snapshot: Vec<(String, Vec<u64>)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (key, timestamps) in &snapshot {
            visit(key, timestamps);
        }
    }

    /// Prune every window to the trailing `window_ms` and evict the empty ones.
    ///
    /// Returns the number of evicted keys.
    pub fn sweep(&self, now: u64, window_ms: u64) -> usize {
        let mut evicted = 0;
        self.entries.retain(|_, timestamps| {
            prune(timestamps, now, window_ms);
            let keep = !timestamps.is_empty();
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
