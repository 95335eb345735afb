//! Identity patching
//!
//! Rewrites the identity fields embedded in a compiled module image so the
//! execution runtime treats every load of the same on-disk file as a
//! distinct loadable unit. The runtime cannot evict an old module image
//! promptly on unload; a fresh internal identity keeps the replacement from
//! colliding with instances still resident in the process.

use crate::format::{CompiledModule, DecodeError, EncodeError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Errors that abort an identity patch.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("corrupt module image: {0}")]
    Corrupt(#[from] DecodeError),

    #[error("failed to re-encode patched module: {0}")]
    Reencode(#[from] EncodeError),
}

/// Result of a successful identity patch.
#[derive(Debug, Clone)]
pub struct PatchedImage {
    /// Re-encoded module bytes carrying the fresh identity.
    pub bytes: Vec<u8>,
    /// Patched internal module name, e.g. `Foo482913`.
    pub module_name: String,
    /// The appended suffix on its own.
    pub suffix: String,
}

/// Generate a fresh identity suffix.
///
/// Seeds a general-purpose PRNG from the hash of a freshly generated UUID so
/// that back-to-back invocations still diverge. Uniqueness is best-effort,
/// not a cryptographic guarantee.
fn identity_suffix() -> String {
    let mut hasher = DefaultHasher::new();
    Uuid::new_v4().hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(hasher.finish());
    rng.gen_range(0..u32::MAX).to_string()
}

/// Rewrite the identity fields of a compiled module image.
///
/// Appends one random suffix to both the module name and the primary unit
/// name; version, dependencies and body re-encode byte-for-byte. The
/// returned image executes identically to the input except for its reported
/// internal identity. Operates purely in memory: the input buffer is never
/// mutated and no I/O is performed.
pub fn patch_identity(raw: &[u8]) -> Result<PatchedImage, PatchError> {
    let mut module = CompiledModule::decode(raw)?;

    let suffix = identity_suffix();
    module.metadata.name.push_str(&suffix);
    module.metadata.primary_unit.push_str(&suffix);

    let bytes = module.encode()?;
    Ok(PatchedImage {
        bytes,
        module_name: module.metadata.name,
        suffix,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ModuleMetadata;

    fn sample_image() -> Vec<u8> {
        CompiledModule {
            metadata: ModuleMetadata {
                name: "Foo".to_string(),
                primary_unit: "Foo".to_string(),
                version: "2.4.1".to_string(),
                dependencies: vec!["Core".to_string()],
            },
            body: b"opcodes".to_vec(),
        }
        .encode()
        .unwrap()
    }

    #[test]
    fn test_patch_appends_same_suffix_to_both_identity_fields() {
        let patched = patch_identity(&sample_image()).unwrap();
        let module = CompiledModule::decode(&patched.bytes).unwrap();

        assert_eq!(module.metadata.name, format!("Foo{}", patched.suffix));
        assert_eq!(module.metadata.primary_unit, format!("Foo{}", patched.suffix));
        assert_eq!(module.metadata.name, patched.module_name);
        patched.suffix.parse::<u32>().unwrap();
    }

    #[test]
    fn test_patch_leaves_everything_else_unchanged() {
        let raw = sample_image();
        let original = CompiledModule::decode(&raw).unwrap();
        let patched = patch_identity(&raw).unwrap();
        let module = CompiledModule::decode(&patched.bytes).unwrap();

        assert_eq!(module.metadata.version, original.metadata.version);
        assert_eq!(module.metadata.dependencies, original.metadata.dependencies);
        assert_eq!(module.body, original.body);
    }

    #[test]
    fn test_successive_patches_get_distinct_suffixes() {
        let raw = sample_image();
        let first = patch_identity(&raw).unwrap();
        let second = patch_identity(&raw).unwrap();
        assert_ne!(first.suffix, second.suffix);
        assert_ne!(first.module_name, second.module_name);
    }

    #[test]
    fn test_input_buffer_is_not_mutated() {
        let raw = sample_image();
        let before = raw.clone();
        patch_identity(&raw).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn test_corrupt_image_fails_to_patch() {
        assert!(matches!(
            patch_identity(b"not a module"),
            Err(PatchError::Corrupt(_))
        ));

        let truncated = &sample_image()[..10];
        assert!(matches!(
            patch_identity(truncated),
            Err(PatchError::Corrupt(_))
        ));
    }
}
