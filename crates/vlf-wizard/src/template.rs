//! Template selection: which document template fits a segment configuration.
//!
//! Identifiers are built deterministically from the phase code and the
//! literal segment count, e.g. three-phase with 3 segments is
//! `templateVLF3FS3TR`. Where templates live is the business of a
//! [`TemplateStore`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{SegmentType, TemplateError};

/// Identifier of one report template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(String);

impl TemplateId {
    /// Wrap an arbitrary identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the template identifier for a segment configuration.
///
/// Pure: the same inputs always give the same identifier. The count is
/// not range-checked here; step validation rejects out-of-bound counts
/// before any lookup happens.
#[must_use]
pub fn resolve(segment_type: SegmentType, count: u32) -> TemplateId {
    TemplateId(format!("templateVLF{}FS{count}TR", segment_type.phase_code()))
}

/// A loaded template, opaque to the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateHandle {
    id: TemplateId,
    bytes: Vec<u8>,
}

impl TemplateHandle {
    /// Wrap loaded template bytes.
    #[must_use]
    pub const fn new(id: TemplateId, bytes: Vec<u8>) -> Self {
        Self { id, bytes }
    }

    /// Identifier the template was loaded under.
    #[must_use]
    pub const fn id(&self) -> &TemplateId {
        &self.id
    }

    /// Raw template document bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Keyed lookup of template resources.
pub trait TemplateStore {
    /// Load the template named `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] when no such template exists.
    fn load(&self, id: &TemplateId) -> Result<TemplateHandle, TemplateError>;
}

impl<T: TemplateStore + ?Sized> TemplateStore for &T {
    fn load(&self, id: &TemplateId) -> Result<TemplateHandle, TemplateError> {
        (**self).load(id)
    }
}

/// Templates held in memory, keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    templates: BTreeMap<TemplateId, Vec<u8>>,
}

impl MemoryTemplateStore {
    /// An empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// Add or replace a template.
    pub fn insert(&mut self, id: TemplateId, bytes: Vec<u8>) {
        self.templates.insert(id, bytes);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, id: TemplateId, bytes: Vec<u8>) -> Self {
        self.insert(id, bytes);
        self
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn load(&self, id: &TemplateId) -> Result<TemplateHandle, TemplateError> {
        self.templates
            .get(id)
            .map(|bytes| TemplateHandle::new(id.clone(), bytes.clone()))
            .ok_or_else(|| TemplateError::NotFound(id.clone()))
    }
}
