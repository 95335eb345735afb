//! Module image reading
//!
//! Reads the raw bytes of a compiled module from durable storage. Reading
//! has no side effects and is deterministic: two reads of an unchanged file
//! return byte-identical content.

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};

/// Default file extension for compiled module images.
pub const DEFAULT_MODULE_EXTENSION: &str = "rmod";

/// Errors produced while reading a module image from storage.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("module file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read module file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Build the on-disk path of a named module: `{directory}/{name}.{extension}`.
pub fn module_path(directory: &Path, name: &str, extension: &str) -> PathBuf {
    directory.join(format!("{}.{}", name, extension))
}

/// Read the complete raw content of a compiled module image.
pub fn read_module_image(path: &Path) -> Result<Vec<u8>, ImageError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ImageError::NotFound(path.to_path_buf()),
        _ => ImageError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })
}

/// SHA-256 hex digest of an image, for change detection across reloads.
pub fn image_digest(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_path_layout() {
        let path = module_path(Path::new("/srv/plugins"), "Foo", DEFAULT_MODULE_EXTENSION);
        assert_eq!(path, PathBuf::from("/srv/plugins/Foo.rmod"));
    }

    #[test]
    fn test_read_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.rmod");
        std::fs::write(&path, b"compiled bytes").unwrap();

        let first = read_module_image(&path).unwrap();
        let second = read_module_image(&path).unwrap();
        assert_eq!(first, b"compiled bytes");
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.rmod");
        assert!(matches!(
            read_module_image(&path),
            Err(ImageError::NotFound(p)) if p == path
        ));
    }

    #[test]
    fn test_image_digest_tracks_content() {
        assert_eq!(image_digest(b"abc"), image_digest(b"abc"));
        assert_ne!(image_digest(b"abc"), image_digest(b"abd"));
        assert_eq!(image_digest(b"abc").len(), 64);
    }
}
