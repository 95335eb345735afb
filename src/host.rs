//! Host collaborator seams
//!
//! The loader does not own the plugin manager or the extension subsystem
//! that executes module code; it reaches both through these traits.

use crate::wrapper::{CompiledPlugin, PluginHandle};

/// Completion handler for plugin initialization.
pub type InitCallback<'a> = &'a mut dyn FnMut(Option<PluginHandle>);

/// The host plugin manager, as seen from the loader.
pub trait HostController: Send + Sync {
    /// Request host-level unload of a logical plugin name.
    ///
    /// Treated as blocking: the host invokes
    /// [`CompiledLoader::unloading`](crate::loader::CompiledLoader::unloading)
    /// for every instance it tears down before this returns. Teardown of the
    /// module image inside the execution runtime may still lag behind.
    fn request_unload(&self, name: &str);
}

/// The extension subsystem that executes compiled modules.
pub trait ExtensionRuntime: Send + Sync {
    /// Start a wrapped plugin.
    ///
    /// Calls `done` exactly once: `Some(handle)` carrying the plugin's
    /// resolved logical name on success, `None` when the plugin's own
    /// startup logic failed. The runtime reports startup failures itself;
    /// the loader only skips registration.
    fn start_plugin(&self, plugin: CompiledPlugin, done: InitCallback<'_>);
}
