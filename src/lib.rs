//! Compiled plugin loading for the Rampart plugin host.
//!
//! Loads precompiled binary plugin modules and manages their lifecycle on
//! behalf of the host plugin manager:
//! - Reading compiled module images from disk
//! - Identity patching, so reloading the same on-disk file never collides
//!   with an older instance still resident in the execution runtime
//! - Wrapping patched images for hand-off to the extension runtime
//! - Tracking loaded instances in a per-loader registry
//!
//! The plugin manager and the extension subsystem that executes module code
//! live elsewhere in the host; the loader reaches them through the traits
//! in [`host`].

pub mod format;
pub mod host;
pub mod image;
pub mod loader;
pub mod patch;
pub mod registry;
pub mod state;
pub mod wrapper;

pub use format::{
    CompiledModule, DecodeError, EncodeError, FORMAT_VERSION, MODULE_MAGIC, ModuleMetadata,
};
pub use host::{ExtensionRuntime, HostController, InitCallback};
pub use image::{
    DEFAULT_MODULE_EXTENSION, ImageError, image_digest, module_path, read_module_image,
};
pub use loader::{CompiledLoader, LoadError, LoaderConfig};
pub use patch::{PatchError, PatchedImage, patch_identity};
pub use registry::LoadedPluginRegistry;
pub use state::PluginState;
pub use wrapper::{CompiledPlugin, LoadedPluginInfo, PluginHandle};
