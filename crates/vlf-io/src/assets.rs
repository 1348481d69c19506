//! Static report assets such as the voltage reference tables.

use std::path::{Path, PathBuf};

use vlf_wizard::{AssetStore, CollaboratorError};

use crate::read_optional;
use crate::types::IoError;

/// Assets read from a directory by file name.
#[derive(Debug, Clone)]
pub struct DirectoryAssetStore {
    root: PathBuf,
}

impl DirectoryAssetStore {
    /// Store reading assets from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the store reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for DirectoryAssetStore {
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, CollaboratorError> {
        if name.contains(['/', '\\']) || name == ".." {
            return Ok(None);
        }
        let path = self.root.join(name);
        read_optional(&path).map_err(|source| CollaboratorError::new(IoError::read(path, source)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn loads_present_asset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("imgAceptacion.png"), b"png").unwrap();
        let store = DirectoryAssetStore::new(dir.path());
        assert_eq!(store.load("imgAceptacion.png").unwrap(), Some(b"png".to_vec()));
    }

    #[test]
    fn absent_asset_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryAssetStore::new(dir.path());
        assert_eq!(store.load("imgMantenimiento.png").unwrap(), None);
    }

    #[test]
    fn names_cannot_leave_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("assets");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(dir.path().join("secret.png"), b"x").unwrap();
        let store = DirectoryAssetStore::new(&inner);
        assert_eq!(store.load("../secret.png").unwrap(), None);
    }
}
