//! Templates stored as `{dir}/{id}.docx`.

use std::path::{Path, PathBuf};

use vlf_wizard::{TemplateError, TemplateHandle, TemplateId, TemplateStore};

use crate::read_optional;

/// File extension of template documents.
pub const TEMPLATE_EXTENSION: &str = "docx";

/// A directory of report templates.
#[derive(Debug, Clone)]
pub struct DirectoryTemplateStore {
    root: PathBuf,
}

impl DirectoryTemplateStore {
    /// Store reading templates from `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the store reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path the template `id` is expected at.
    #[must_use]
    pub fn path_of(&self, id: &TemplateId) -> PathBuf {
        self.root.join(format!("{id}.{TEMPLATE_EXTENSION}"))
    }
}

impl TemplateStore for DirectoryTemplateStore {
    fn load(&self, id: &TemplateId) -> Result<TemplateHandle, TemplateError> {
        let path = self.path_of(id);
        match read_optional(&path) {
            Ok(Some(bytes)) => {
                tracing::debug!(template = %id, path = %path.display(), "loaded template");
                Ok(TemplateHandle::new(id.clone(), bytes))
            }
            Ok(None) => Err(TemplateError::NotFound(id.clone())),
            Err(source) => Err(TemplateError::Io {
                id: id.clone(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn loads_template_by_identifier() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("templateVLF1FS2TR.docx"), b"docx").unwrap();
        let store = DirectoryTemplateStore::new(dir.path());
        let handle = store.load(&TemplateId::new("templateVLF1FS2TR")).unwrap();
        assert_eq!(handle.id().as_str(), "templateVLF1FS2TR");
        assert_eq!(handle.bytes(), b"docx");
    }

    #[test]
    fn absent_template_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryTemplateStore::new(dir.path());
        let err = store.load(&TemplateId::new("templateVLF3FS9TR")).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(ref id) if id.as_str() == "templateVLF3FS9TR"));
    }

    #[test]
    fn unreadable_template_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("templateVLF1FS1TR.docx")).unwrap();
        let store = DirectoryTemplateStore::new(dir.path());
        let err = store.load(&TemplateId::new("templateVLF1FS1TR")).unwrap_err();
        assert!(matches!(err, TemplateError::Io { .. }), "{err}");
    }
}
