//! Plugin wrapper
//!
//! In-memory records binding a logical plugin name to its patched compiled
//! image and the runtime identifiers the host tracks it by.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// A compiled plugin wrapped for hand-off to the extension runtime.
#[derive(Debug, Clone)]
pub struct CompiledPlugin {
    /// Logical plugin name from the load request.
    name: String,
    /// Directory the module image was read from.
    directory: PathBuf,
    /// Patched module bytes handed to the execution runtime.
    image: Vec<u8>,
    /// Internal identity after patching (the module name embedded in `image`).
    internal_identity: String,
    /// Identity suffix appended by the patcher.
    identity_suffix: String,
    /// SHA-256 digest of the on-disk image the patch started from.
    source_digest: String,
    /// Instance ID for tracking across reloads.
    instance_id: String,
    /// Creation time.
    created_at: Instant,
}

impl CompiledPlugin {
    /// Wrap a patched module image under its logical plugin name.
    pub fn new(
        name: &str,
        directory: &Path,
        image: Vec<u8>,
        internal_identity: String,
        identity_suffix: String,
        source_digest: String,
    ) -> Self {
        Self {
            name: name.to_string(),
            directory: directory.to_path_buf(),
            image,
            internal_identity,
            identity_suffix,
            source_digest,
            instance_id: uuid::Uuid::now_v7().to_string(),
            created_at: Instant::now(),
        }
    }

    /// Logical plugin name from the load request.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory the module image was read from.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Patched module bytes.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Internal identity embedded in the patched image.
    pub fn internal_identity(&self) -> &str {
        &self.internal_identity
    }

    /// Identity suffix appended by the patcher.
    pub fn identity_suffix(&self) -> &str {
        &self.identity_suffix
    }

    /// SHA-256 digest of the on-disk image this instance was patched from.
    pub fn source_digest(&self) -> &str {
        &self.source_digest
    }

    /// Get the instance ID.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Get creation time.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

/// Host-visible handle for a successfully initialized plugin.
///
/// Carries the logical name the plugin resolved to during initialization,
/// which may differ from the name it was loaded under.
#[derive(Debug)]
pub struct PluginHandle {
    name: String,
    plugin: CompiledPlugin,
    loaded_at: u64,
}

impl PluginHandle {
    /// Bind an initialized plugin to its resolved logical name.
    pub fn new(name: impl Into<String>, plugin: CompiledPlugin) -> Self {
        Self {
            name: name.into(),
            plugin,
            loaded_at: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
        }
    }

    /// Resolved logical name, the registry key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The wrapped plugin.
    pub fn plugin(&self) -> &CompiledPlugin {
        &self.plugin
    }

    /// Load timestamp, seconds since the UNIX epoch.
    pub fn loaded_at(&self) -> u64 {
        self.loaded_at
    }

    /// Serializable summary for host diagnostics.
    pub fn info(&self) -> LoadedPluginInfo {
        LoadedPluginInfo {
            name: self.name.clone(),
            internal_identity: self.plugin.internal_identity.clone(),
            instance_id: self.plugin.instance_id.clone(),
            source_digest: self.plugin.source_digest.clone(),
            loaded_at: self.loaded_at,
        }
    }
}

/// Summary of a loaded plugin surfaced to host diagnostics and consoles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedPluginInfo {
    /// Logical plugin name.
    pub name: String,
    /// Internal identity of the currently loaded image.
    pub internal_identity: String,
    /// Instance ID.
    pub instance_id: String,
    /// SHA-256 digest of the source image.
    pub source_digest: String,
    /// Load timestamp, seconds since the UNIX epoch.
    pub loaded_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plugin(name: &str) -> CompiledPlugin {
        CompiledPlugin::new(
            name,
            Path::new("/srv/plugins"),
            vec![1, 2, 3],
            format!("{}90125", name),
            "90125".to_string(),
            "digest".to_string(),
        )
    }

    #[test]
    fn test_instance_ids_are_unique() {
        let a = sample_plugin("Foo");
        let b = sample_plugin("Foo");
        assert_ne!(a.instance_id(), b.instance_id());
    }

    #[test]
    fn test_handle_reports_resolved_name() {
        let handle = PluginHandle::new("Renamed", sample_plugin("Foo"));
        assert_eq!(handle.name(), "Renamed");
        assert_eq!(handle.plugin().name(), "Foo");
    }

    #[test]
    fn test_info_reflects_handle() {
        let handle = PluginHandle::new("Foo", sample_plugin("Foo"));
        let info = handle.info();
        assert_eq!(info.name, "Foo");
        assert_eq!(info.internal_identity, "Foo90125");
        assert_eq!(info.instance_id, handle.plugin().instance_id());
        assert_eq!(info.loaded_at, handle.loaded_at());
    }
}
