//! The OPC zip container behind a `.docx` file.

use std::io::{Cursor, Read, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::types::DocxError;

/// Main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Package-wide content type registry.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const EMPTY_RELATIONSHIPS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    "\n",
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#
);

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
}

/// All parts of a package, in archive order.
#[derive(Debug, Clone)]
pub struct Package {
    entries: Vec<Entry>,
}

impl Package {
    /// Read every part of a zip archive.
    ///
    /// # Errors
    ///
    /// Returns [`DocxError::Zip`] if `bytes` is not a readable archive.
    pub fn read(bytes: &[u8]) -> Result<Self, DocxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                data,
            });
        }
        Ok(Self { entries })
    }

    /// Part names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Whether the package has part `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Part `name` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`DocxError::MissingPart`] or [`DocxError::Malformed`].
    pub fn text(&self, name: &str) -> Result<String, DocxError> {
        let entry = self
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| DocxError::MissingPart(name.to_string()))?;
        String::from_utf8(entry.data.clone()).map_err(|_| DocxError::Malformed {
            part: name.to_string(),
            reason: "not UTF-8",
        })
    }

    /// Replace part `name`, appending it if new.
    pub fn put(&mut self, name: &str, data: Vec<u8>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.data = data;
        } else {
            self.entries.push(Entry {
                name: name.to_string(),
                data,
            });
        }
    }

    /// Relationships of part `name`, or an empty list if it has none yet.
    ///
    /// # Errors
    ///
    /// Returns [`DocxError::Malformed`] if the relationships part is not UTF-8.
    pub fn relationships_of(&self, name: &str) -> Result<(String, String), DocxError> {
        let path = relationships_path(name);
        let xml = if self.contains(&path) {
            self.text(&path)?
        } else {
            EMPTY_RELATIONSHIPS.to_string()
        };
        Ok((path, xml))
    }

    /// Serialize to zip bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DocxError::Zip`] or [`DocxError::Io`] if writing fails.
    pub fn write(&self) -> Result<Vec<u8>, DocxError> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in &self.entries {
            writer.start_file(entry.name.as_str(), options)?;
            writer.write_all(&entry.data)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

/// `word/_rels/document.xml.rels` for `word/document.xml`.
#[must_use]
pub fn relationships_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Whether `name` holds story text that may contain placeholders.
#[must_use]
pub fn is_story_part(name: &str) -> bool {
    let Some(file) = name.strip_prefix("word/") else {
        return false;
    };
    let Some(stem) = file.strip_suffix(".xml") else {
        return false;
    };
    stem == "document"
        || stem
            .strip_prefix("header")
            .or_else(|| stem.strip_prefix("footer"))
            .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
}

/// Insert `markup` before the closing `</{element}>` tag of `xml`.
///
/// # Errors
///
/// Returns [`DocxError::Malformed`] naming `part` if the tag is missing.
pub fn insert_before_close(
    xml: &str,
    element: &str,
    markup: &str,
    part: &str,
) -> Result<String, DocxError> {
    let close = format!("</{element}>");
    let at = xml.rfind(&close).ok_or_else(|| DocxError::Malformed {
        part: part.to_string(),
        reason: "missing closing root tag",
    })?;
    let mut out = String::with_capacity(xml.len() + markup.len());
    out.push_str(&xml[..at]);
    out.push_str(markup);
    out.push_str(&xml[at..]);
    Ok(out)
}
