//! Plugin lifecycle states

use serde::{Deserialize, Serialize};

/// Lifecycle state of a logical plugin name within the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PluginState {
    /// Not loaded
    #[default]
    Unloaded,
    /// Load in progress
    Loading,
    /// Loaded and registered
    Loaded,
    /// Teardown in progress
    Unloading,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PluginState::Unloaded => write!(f, "Unloaded"),
            PluginState::Loading => write!(f, "Loading"),
            PluginState::Loaded => write!(f, "Loaded"),
            PluginState::Unloading => write!(f, "Unloading"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plugin_state_display() {
        assert_eq!(PluginState::Unloaded.to_string(), "Unloaded");
        assert_eq!(PluginState::Loaded.to_string(), "Loaded");
    }

    #[test]
    fn test_default_state() {
        assert_eq!(PluginState::default(), PluginState::Unloaded);
    }
}
