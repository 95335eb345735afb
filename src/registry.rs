//! Loaded-plugin registry
//!
//! Maps logical plugin names to active plugin handles. Each loader instance
//! owns its registry; nothing here is process-global.

use crate::state::PluginState;
use crate::wrapper::{LoadedPluginInfo, PluginHandle};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of currently loaded plugins, keyed by logical name.
///
/// Safe to share across threads for operations on different names. Holds at
/// most one entry per logical name: inserting a name that is already present
/// replaces the previous handle.
#[derive(Default)]
pub struct LoadedPluginRegistry {
    plugins: RwLock<HashMap<String, Arc<PluginHandle>>>,
}

impl LoadedPluginRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a handle under its resolved name, returning any replaced entry.
    pub fn insert(&self, handle: Arc<PluginHandle>) -> Option<Arc<PluginHandle>> {
        let name = handle.name().to_string();
        let old = self.plugins.write().insert(name.clone(), handle);
        if old.is_some() {
            debug!("Replacing registry entry for plugin: {}", name);
        }
        old
    }

    /// Remove the entry for `name`, if present. Idempotent.
    pub fn remove(&self, name: &str) -> Option<Arc<PluginHandle>> {
        self.plugins.write().remove(name)
    }

    /// Get the handle registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<PluginHandle>> {
        self.plugins.read().get(name).cloned()
    }

    /// Check whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.read().contains_key(name)
    }

    /// Logical names of all loaded plugins.
    pub fn names(&self) -> Vec<String> {
        self.plugins.read().keys().cloned().collect()
    }

    /// Number of loaded plugins.
    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }

    /// Lifecycle state of a logical name as tracked by this registry.
    pub fn state_of(&self, name: &str) -> PluginState {
        if self.contains(name) {
            PluginState::Loaded
        } else {
            PluginState::Unloaded
        }
    }

    /// Serializable summaries of every loaded plugin.
    pub fn snapshot(&self) -> Vec<LoadedPluginInfo> {
        self.plugins.read().values().map(|h| h.info()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapper::CompiledPlugin;
    use std::path::Path;

    fn handle(name: &str) -> Arc<PluginHandle> {
        let plugin = CompiledPlugin::new(
            name,
            Path::new("/srv/plugins"),
            vec![0],
            format!("{}123", name),
            "123".to_string(),
            "digest".to_string(),
        );
        Arc::new(PluginHandle::new(name, plugin))
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = LoadedPluginRegistry::new();
        assert!(registry.is_empty());

        registry.insert(handle("Foo"));
        assert!(registry.contains("Foo"));
        assert_eq!(registry.get("Foo").unwrap().name(), "Foo");
        assert_eq!(registry.state_of("Foo"), PluginState::Loaded);

        assert!(registry.remove("Foo").is_some());
        assert!(!registry.contains("Foo"));
        assert_eq!(registry.state_of("Foo"), PluginState::Unloaded);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = LoadedPluginRegistry::new();
        assert!(registry.remove("Ghost").is_none());
        assert!(registry.remove("Ghost").is_none());
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let registry = LoadedPluginRegistry::new();
        let first = handle("Foo");
        let second = handle("Foo");

        assert!(registry.insert(first.clone()).is_none());
        let replaced = registry.insert(second.clone()).unwrap();
        assert_eq!(
            replaced.plugin().instance_id(),
            first.plugin().instance_id()
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("Foo").unwrap().plugin().instance_id(),
            second.plugin().instance_id()
        );
    }

    #[test]
    fn test_names_and_snapshot() {
        let registry = LoadedPluginRegistry::new();
        registry.insert(handle("Foo"));
        registry.insert(handle("Bar"));

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["Bar".to_string(), "Foo".to_string()]);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().any(|info| info.name == "Foo"));
    }
}
