//! Fill a `.docx` template with a [`RenderContext`].
//!
//! Text entries replace `{{ key }}` placeholders in the main document,
//! headers and footers. Image entries become inline pictures: the bytes
//! are stored as a media part, linked from the story part's relationships
//! and given a content-type default, and the placeholder run is split
//! around a `<w:drawing>`.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use vlf_wizard::{ContextEntry, ImageArtifact, RenderContext, ReportRenderer, TemplateHandle};

use crate::package::{
    CONTENT_TYPES_PART, DOCUMENT_PART, Package, insert_before_close, is_story_part,
};
use crate::placeholder::{Placeholders, text_markup};
use crate::types::DocxError;

/// English Metric Units per centimetre.
pub const EMU_PER_CM: f64 = 360_000.0;

/// First `wp:docPr` id handed to embedded pictures.
const FIRST_DRAWING_ID: usize = 1000;

const IMAGE_RELATIONSHIP: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// Renders reports from Word templates.
#[derive(Debug, Clone)]
pub struct DocxRenderer {
    placeholders: Placeholders,
}

/// A media part queued for the package.
struct Media {
    path: String,
    extension: &'static str,
    mime: &'static str,
    bytes: Vec<u8>,
}

impl DocxRenderer {
    /// Build a renderer.
    ///
    /// # Errors
    ///
    /// Returns [`DocxError::Pattern`] if the placeholder patterns fail to
    /// compile.
    pub fn new() -> Result<Self, DocxError> {
        Ok(Self {
            placeholders: Placeholders::new()?,
        })
    }

    /// Fill `template` (docx bytes) with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`DocxError::MissingKey`] for a placeholder the context does
    /// not carry, and other [`DocxError`] variants for unreadable packages
    /// or images.
    pub fn render_docx(&self, template: &[u8], context: &RenderContext) -> Result<Vec<u8>, DocxError> {
        let mut package = Package::read(template)?;
        if !package.contains(DOCUMENT_PART) {
            return Err(DocxError::MissingPart(DOCUMENT_PART.to_string()));
        }

        let parts: Vec<String> = package
            .names()
            .filter(|name| is_story_part(name))
            .map(str::to_string)
            .collect();

        let mut media = Vec::new();
        for part in &parts {
            let xml = self.placeholders.repair(&package.text(part)?);
            let mut relationships = String::new();
            let filled = self.placeholders.substitute(&xml, |key| {
                match context.get(key) {
                    None => Err(DocxError::MissingKey(key.to_string())),
                    Some(ContextEntry::Value(value)) => Ok(text_markup(value)),
                    Some(ContextEntry::NoImage) => Ok(String::new()),
                    Some(ContextEntry::Image(artifact)) => {
                        let n = media.len() + 1;
                        let (item, drawing) = embed(key, artifact, n)?;
                        let _ = write!(
                            relationships,
                            r#"<Relationship Id="{}" Type="{IMAGE_RELATIONSHIP}" Target="{}"/>"#,
                            relationship_id(n),
                            item.path.trim_start_matches("word/"),
                        );
                        media.push(item);
                        Ok(drawing)
                    }
                }
            })?;
            package.put(part, filled.into_bytes());

            if !relationships.is_empty() {
                let (path, rels) = package.relationships_of(part)?;
                let rels = insert_before_close(&rels, "Relationships", &relationships, &path)?;
                package.put(&path, rels.into_bytes());
            }
        }

        register_content_types(&mut package, &media)?;
        let images = media.len();
        for item in media {
            package.put(&item.path, item.bytes);
        }
        tracing::debug!(parts = parts.len(), images, "filled report template");
        package.write()
    }
}

impl ReportRenderer for DocxRenderer {
    type Error = DocxError;

    fn render(&self, template: &TemplateHandle, context: &RenderContext) -> Result<Vec<u8>, DocxError> {
        self.render_docx(template.bytes(), context)
    }
}

fn relationship_id(n: usize) -> String {
    format!("rIdVlf{n}")
}

/// Media part and drawing markup for the `n`th picture.
fn embed(key: &str, artifact: &ImageArtifact, n: usize) -> Result<(Media, String), DocxError> {
    let format = image::guess_format(&artifact.bytes).map_err(|source| DocxError::Image {
        key: key.to_string(),
        source,
    })?;
    let (extension, mime) = match format {
        ImageFormat::Png => ("png", "image/png"),
        ImageFormat::Jpeg => ("jpeg", "image/jpeg"),
        other => {
            return Err(DocxError::UnsupportedImage {
                key: key.to_string(),
                format: format!("{other:?}"),
            });
        }
    };
    let (width, height) = ImageReader::with_format(Cursor::new(&artifact.bytes), format)
        .into_dimensions()
        .map_err(|source| DocxError::Image {
            key: key.to_string(),
            source,
        })?;

    let (cx, cy) = extent_emu(artifact.width_cm, width, height);
    let file = format!("vlf_image{n}.{extension}");
    let drawing = drawing_markup(&relationship_id(n), FIRST_DRAWING_ID + n, &file, cx, cy);
    let media = Media {
        path: format!("word/media/{file}"),
        extension,
        mime,
        bytes: artifact.bytes.clone(),
    };
    Ok((media, drawing))
}

/// Page extent in EMU for an image `width_cm` wide, keeping its aspect ratio.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn extent_emu(width_cm: f64, width_px: u32, height_px: u32) -> (i64, i64) {
    let cx = (width_cm * EMU_PER_CM).round();
    let cy = if width_px == 0 {
        0.0
    } else {
        (cx * f64::from(height_px) / f64::from(width_px)).round()
    };
    (cx as i64, cy as i64)
}

/// Closes the placeholder's text run, emits a picture run, and reopens a
/// text run for whatever followed the placeholder.
fn drawing_markup(rid: &str, id: usize, name: &str, cx: i64, cy: i64) -> String {
    format!(
        concat!(
            r#"</w:t></w:r><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0""#,
            r#" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing""#,
            r#" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main""#,
            r#" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#,
            r#" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
            r#"<w:r><w:t xml:space="preserve">"#,
        ),
        cx = cx,
        cy = cy,
        id = id,
        name = name,
        rid = rid,
    )
}

fn register_content_types(package: &mut Package, media: &[Media]) -> Result<(), DocxError> {
    if media.is_empty() {
        return Ok(());
    }
    let mut types = package.text(CONTENT_TYPES_PART)?;
    let needed: BTreeSet<(&str, &str)> = media.iter().map(|m| (m.extension, m.mime)).collect();
    for (extension, mime) in needed {
        let declared = format!(r#"extension="{extension}""#);
        if types.to_ascii_lowercase().contains(&declared) {
            continue;
        }
        let entry = format!(r#"<Default Extension="{extension}" ContentType="{mime}"/>"#);
        types = insert_before_close(&types, "Types", &entry, CONTENT_TYPES_PART)?;
    }
    package.put(CONTENT_TYPES_PART, types.into_bytes());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_keeps_aspect_ratio() {
        assert_eq!(extent_emu(18.0, 600, 400), (6_480_000, 4_320_000));
        assert_eq!(extent_emu(14.0, 100, 100), (5_040_000, 5_040_000));
        assert_eq!(extent_emu(1.0, 0, 10), (360_000, 0));
    }

    #[test]
    fn drawing_closes_and_reopens_text_run() {
        let markup = drawing_markup("rIdVlf1", 1001, "vlf_image1.png", 10, 20);
        assert!(markup.starts_with("</w:t></w:r><w:r><w:drawing>"));
        assert!(markup.ends_with(r#"<w:r><w:t xml:space="preserve">"#));
        assert!(markup.contains(r#"r:embed="rIdVlf1""#));
        assert!(markup.contains(r#"<wp:extent cx="10" cy="20"/>"#));
    }
}
