use std::sync::Arc;

use dashmap::DashMap;
use tracing::warn;

use super::NodeWatcher;
use super::WatchKey;

/// Process-wide watcher registry: at most one live [`NodeWatcher`] per
/// [`WatchKey`].
///
/// # Thread Safety
///
/// All methods are safe to call concurrently. `get_or_create` is atomic
/// check-then-create: the factory runs at most once per key even when many
/// threads race to register it.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    /// Watchers keyed by logical identity
    watchers: DashMap<WatchKey, Arc<NodeWatcher>>,
    /// Routing index from the remote node path back to the key, used by
    /// the dispatcher to deliver fired events
    by_path: DashMap<String, WatchKey>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the watcher for `key`, constructing it via `factory` if this
    /// is the first registration. Never returns two different instances for
    /// the same key within one process lifetime.
    pub fn get_or_create<F>(
        &self,
        key: WatchKey,
        factory: F,
    ) -> Arc<NodeWatcher>
    where
        F: FnOnce() -> Arc<NodeWatcher>,
    {
        let watcher = self
            .watchers
            .entry(key.clone())
            .or_insert_with(factory)
            .clone();
        self.by_path
            .insert(watcher.monitor_path().to_string(), key);
        watcher
    }

    /// Lookup by key. A miss is a benign race (event for a key being
    /// registered concurrently), logged but not an error.
    pub fn get(
        &self,
        key: &WatchKey,
    ) -> Option<Arc<NodeWatcher>> {
        let found = self.watchers.get(key).map(|entry| entry.value().clone());
        if found.is_none() {
            warn!(key = %key, "no watcher registered for key");
        }
        found
    }

    /// Route a fired event's path to its watcher.
    pub fn find_by_path(
        &self,
        path: &str,
    ) -> Option<Arc<NodeWatcher>> {
        let key = self.by_path.get(path)?.value().clone();
        self.watchers.get(&key).map(|entry| entry.value().clone())
    }

    /// Snapshot of all registered keys. The reconnect sweep iterates this
    /// copy; keys registered after the snapshot rely on their own initial
    /// `arm()` and are not double-fired.
    pub fn list(&self) -> Vec<WatchKey> {
        self.watchers.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }
}
