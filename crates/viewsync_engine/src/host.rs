//! Host capability surface.
//!
//! The embedding application owns the persistent key-value store, the
//! live playback-progress model and the visible favorites list. The
//! engine never touches those directly; it goes through [`HostApi`], and
//! tests substitute [`MemoryHost`].

use parking_lot::RwLock;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use viewsync_merge::WatchProgressEntry;

/// Change listener invoked synchronously inside every non-silent `set`,
/// with the mutated key.
///
/// Listeners fire for the engine's own writes too; the re-entrancy guard
/// is what distinguishes those from genuine user mutation.
pub type ChangeListener = Box<dyn Fn(&str) + Send + Sync>;

/// Capabilities the host application provides to the engine.
pub trait HostApi: Send + Sync {
    /// Reads a key, returning `default` when absent.
    fn get(&self, key: &str, default: &Value) -> Value;

    /// Writes a key. A silent write does not notify change listeners.
    fn set(&self, key: &str, value: Value, silent: bool);

    /// Registers a change listener.
    fn subscribe(&self, listener: ChangeListener);

    /// Merges one item's progress into the host's live model.
    ///
    /// This is deliberately per-item: the host may keep fields on an
    /// entry this engine knows nothing about, and a whole-file overwrite
    /// would destroy them.
    fn update_progress(&self, view: &str, hash: u64, entry: WatchProgressEntry);

    /// Asks the host to reload visible watch progress from the store.
    fn reload_progress(&self);

    /// Asks the host to reload the visible favorites list from the store.
    fn reload_favorites(&self);
}

/// An in-memory host for tests.
///
/// Mirrors the store semantics the engine relies on: synchronous change
/// listeners, per-item progress updates that preserve unknown entry
/// fields, and counters for the reload signals.
#[derive(Default)]
pub struct MemoryHost {
    data: RwLock<Map<String, Value>>,
    listeners: RwLock<Vec<ChangeListener>>,
    progress_updates: RwLock<Vec<(String, u64, WatchProgressEntry)>>,
    progress_reloads: AtomicUsize,
    favorite_reloads: AtomicUsize,
}

impl MemoryHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a key without notifying listeners.
    pub fn seed(&self, key: &str, value: Value) {
        self.data.write().insert(key.to_string(), value);
    }

    /// All per-item progress updates issued so far.
    pub fn progress_updates(&self) -> Vec<(String, u64, WatchProgressEntry)> {
        self.progress_updates.read().clone()
    }

    /// Number of progress reload signals received.
    pub fn progress_reloads(&self) -> usize {
        self.progress_reloads.load(Ordering::SeqCst)
    }

    /// Number of favorites reload signals received.
    pub fn favorite_reloads(&self) -> usize {
        self.favorite_reloads.load(Ordering::SeqCst)
    }

    fn notify(&self, key: &str) {
        for listener in self.listeners.read().iter() {
            listener(key);
        }
    }
}

impl HostApi for MemoryHost {
    fn get(&self, key: &str, default: &Value) -> Value {
        self.data
            .read()
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.clone())
    }

    fn set(&self, key: &str, value: Value, silent: bool) {
        self.data.write().insert(key.to_string(), value);
        if !silent {
            self.notify(key);
        }
    }

    fn subscribe(&self, listener: ChangeListener) {
        self.listeners.write().push(listener);
    }

    fn update_progress(&self, view: &str, hash: u64, entry: WatchProgressEntry) {
        {
            let mut data = self.data.write();
            let file = data
                .entry(view.to_string())
                .or_insert_with(|| json!({}));
            if !file.is_object() {
                *file = json!({});
            }
            let slot = file
                .as_object_mut()
                .expect("file is an object")
                .entry(hash.to_string())
                .or_insert_with(|| json!({}));
            match slot.as_object_mut() {
                Some(fields) => {
                    fields.insert("percent".into(), json!(entry.percent));
                    fields.insert("time".into(), json!(entry.time));
                    fields.insert("duration".into(), json!(entry.duration));
                    fields.insert("profile".into(), json!(entry.profile));
                }
                None => *slot = serde_json::to_value(entry).expect("entry serializes"),
            }
        }
        self.progress_updates
            .write()
            .push((view.to_string(), hash, entry));
        self.notify(view);
    }

    fn reload_progress(&self) {
        self.progress_reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn reload_favorites(&self) {
        self.favorite_reloads.fetch_add(1, Ordering::SeqCst);
    }
}
