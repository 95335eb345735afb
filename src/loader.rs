//! Compiled plugin loader
//!
//! Orchestrates the load path — read image, patch identity, wrap, hand to
//! the extension runtime, register — and exposes the load/reload/unload
//! entry points the host plugin manager drives.

use crate::host::{ExtensionRuntime, HostController};
use crate::image::{self, DEFAULT_MODULE_EXTENSION, ImageError};
use crate::patch::{self, PatchError};
use crate::registry::LoadedPluginRegistry;
use crate::state::PluginState;
use crate::wrapper::{CompiledPlugin, PluginHandle};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// File extension of compiled module images.
    pub module_extension: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            module_extension: DEFAULT_MODULE_EXTENSION.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Create a default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the module file extension.
    pub fn with_module_extension(mut self, extension: &str) -> Self {
        self.module_extension = extension.to_string();
        self
    }
}

/// Errors that abort a single load attempt.
///
/// A failed load leaves the registry untouched and never affects other
/// loaded plugins.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

/// Loader for compiled plugin modules.
///
/// Load and reload run synchronously on the caller's thread; there is no
/// background task and no retry. The registry is safe for concurrent
/// operations on different logical names. Overlapping load/reload calls for
/// the *same* name are not serialized here and must not be issued by the
/// host.
pub struct CompiledLoader {
    config: LoaderConfig,
    runtime: Arc<dyn ExtensionRuntime>,
    host: Arc<dyn HostController>,
    registry: LoadedPluginRegistry,
}

impl CompiledLoader {
    /// Create a loader with the default configuration.
    pub fn new(runtime: Arc<dyn ExtensionRuntime>, host: Arc<dyn HostController>) -> Self {
        Self::with_config(LoaderConfig::default(), runtime, host)
    }

    /// Create a loader with an explicit configuration.
    pub fn with_config(
        config: LoaderConfig,
        runtime: Arc<dyn ExtensionRuntime>,
        host: Arc<dyn HostController>,
    ) -> Self {
        Self {
            config,
            runtime,
            host,
            registry: LoadedPluginRegistry::new(),
        }
    }

    /// The registry of currently loaded plugins.
    pub fn registry(&self) -> &LoadedPluginRegistry {
        &self.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Attempt to synchronously load a compiled plugin.
    ///
    /// Reads `{directory}/{name}.{extension}`, patches the module identity
    /// so the image cannot collide with a previous load still resident in
    /// the execution runtime, and hands the wrapped plugin to the runtime.
    /// On successful initialization the handle is registered under the
    /// logical name the plugin resolved to — which may differ from `name`
    /// if the plugin renames itself — and returned.
    ///
    /// Returns `Ok(None)` when the plugin's own initialization failed; the
    /// runtime has already reported that failure and the registry is left
    /// untouched. Read and patch errors abort the attempt the same way.
    pub fn load(
        &self,
        directory: &Path,
        name: &str,
    ) -> Result<Option<Arc<PluginHandle>>, LoadError> {
        let path = image::module_path(directory, name, &self.config.module_extension);
        debug!("{} -> {}: reading {}", name, PluginState::Loading, path.display());

        let raw = image::read_module_image(&path)?;
        let digest = image::image_digest(&raw);

        let patched = patch::patch_identity(&raw)?;
        info!(
            "Patched module identity for {}: {} (image digest {})",
            name,
            patched.module_name,
            &digest[..12]
        );

        let plugin = CompiledPlugin::new(
            name,
            directory,
            patched.bytes,
            patched.module_name,
            patched.suffix,
            digest,
        );

        let mut registered = None;
        self.runtime.start_plugin(plugin, &mut |handle| {
            if let Some(handle) = handle {
                let handle = Arc::new(handle);
                if self.registry.insert(handle.clone()).is_some() {
                    warn!(
                        "Replaced a still-registered instance of plugin: {}",
                        handle.name()
                    );
                }
                info!("{} -> {}", handle.name(), PluginState::Loaded);
                registered = Some(handle);
            }
        });

        Ok(registered)
    }

    /// Eject any current instance of `name` and load a fresh one.
    ///
    /// The unload request blocks until the host has notified
    /// [`unloading`](Self::unloading) for each instance it tore down;
    /// teardown of the old image inside the execution runtime may still be
    /// deferred, which is what the fresh internal identity of the new image
    /// covers. Load failures are logged rather than propagated: one broken
    /// plugin must not take the host down.
    pub fn reload(&self, directory: &Path, name: &str) {
        let previous_digest = self
            .registry
            .get(name)
            .map(|h| h.plugin().source_digest().to_string());

        info!("Reloading plugin: {}", name);
        self.host.request_unload(name);

        match self.load(directory, name) {
            Ok(Some(handle)) => match previous_digest {
                Some(old) if old == handle.plugin().source_digest() => {
                    debug!("Module image for {} unchanged on disk since last load", name);
                }
                Some(_) => {
                    debug!("Module image for {} changed on disk", name);
                }
                None => {}
            },
            Ok(None) => {}
            Err(e) => error!("Failed to reload plugin {}: {}", name, e),
        }
    }

    /// Notification that the host plugin manager is unloading a plugin this
    /// loader registered.
    ///
    /// Removes the registry entry keyed by the instance's current name; a
    /// no-op when the entry is already absent.
    pub fn unloading(&self, handle: &PluginHandle) {
        match self.registry.remove(handle.name()) {
            Some(_) => info!("{} -> {}", handle.name(), PluginState::Unloading),
            None => debug!(
                "Unload notification for unregistered plugin: {}",
                handle.name()
            ),
        }
    }
}
