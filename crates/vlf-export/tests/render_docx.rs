#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{Cursor, Read, Write};

use image::{Rgba, RgbaImage};
use serde_json::json;
use vlf_export::{DocxError, DocxRenderer};
use vlf_wizard::{ContextEntry, ImageArtifact, RenderContext, ReportRenderer, TemplateHandle, TemplateId};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

fn document(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    )
}

fn paragraph(text: &str) -> String {
    format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
}

fn template(parts: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    for (name, xml) in parts {
        writer.start_file(*name, options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn part(docx: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).unwrap();
    Some(data)
}

fn part_text(docx: &[u8], name: &str) -> String {
    String::from_utf8(part(docx, name).expect(name)).unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn renderer() -> DocxRenderer {
    DocxRenderer::new().unwrap()
}

#[test]
fn fills_text_placeholders_split_across_runs() {
    let body = concat!(
        r#"<w:p><w:r><w:t>Proyecto: {</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>{ nombre</w:t></w:r>"#,
        r#"<w:r><w:t>Proyecto }}</w:t></w:r></w:p>"#,
    );
    let docx = template(&[("word/document.xml", &document(body))]);
    let mut context = RenderContext::new();
    context.insert("nombreProyecto", ContextEntry::Value(json!("SUBESTACION NORTE")));

    let out = renderer().render_docx(&docx, &context).unwrap();
    let xml = part_text(&out, "word/document.xml");
    assert!(xml.contains("SUBESTACION NORTE"), "{xml}");
    assert!(!xml.contains("{{"), "{xml}");
}

#[test]
fn escapes_text_and_formats_numbers() {
    let body = paragraph("{{ cliente }} a {{ valTensionPrueba }} kV, {{ corriente }} A");
    let docx = template(&[("word/document.xml", &document(&body))]);
    let mut context = RenderContext::new();
    context.insert("cliente", ContextEntry::Value(json!("LUZ & FUERZA <S.A.>")));
    context.insert("valTensionPrueba", ContextEntry::Value(json!(21)));
    context.insert("corriente", ContextEntry::Value(json!(4.65)));

    let out = renderer().render_docx(&docx, &context).unwrap();
    let xml = part_text(&out, "word/document.xml");
    assert!(xml.contains("LUZ &amp; FUERZA &lt;S.A.&gt; a 21 kV, 4.65 A"), "{xml}");
}

#[test]
fn fills_headers_and_footers() {
    let docx = template(&[
        ("word/document.xml", &document(&paragraph("cuerpo"))),
        ("word/header1.xml", &document(&paragraph("{{ dia }} de {{ mes }}"))),
        ("word/footer1.xml", &document(&paragraph("{{ anio }}"))),
    ]);
    let mut context = RenderContext::new();
    context.insert("dia", ContextEntry::Value(json!(15)));
    context.insert("mes", ContextEntry::Value(json!("marzo")));
    context.insert("anio", ContextEntry::Value(json!(2024)));

    let out = renderer().render_docx(&docx, &context).unwrap();
    assert!(part_text(&out, "word/header1.xml").contains("15 de marzo"));
    assert!(part_text(&out, "word/footer1.xml").contains("2024"));
}

#[test]
fn embeds_images_with_relationship_and_content_type() {
    let body = format!("{}{}", paragraph("Mapa: {{ imgUbicacion }} fin"), paragraph("{{ fotoTramo1 }}"));
    let docx = template(&[("word/document.xml", &document(&body))]);
    let mut context = RenderContext::new();
    context.insert(
        "imgUbicacion",
        ContextEntry::Image(ImageArtifact {
            bytes: png(60, 40),
            width_cm: 18.0,
        }),
    );
    context.insert("fotoTramo1", ContextEntry::NoImage);

    let out = renderer().render_docx(&docx, &context).unwrap();
    let xml = part_text(&out, "word/document.xml");
    assert!(xml.contains("<w:drawing>"), "{xml}");
    assert!(xml.contains(r#"r:embed="rIdVlf1""#));
    assert!(xml.contains(r#"<wp:extent cx="6480000" cy="4320000"/>"#), "{xml}");
    assert!(xml.contains(r#"<w:t xml:space="preserve"> fin</w:t>"#), "{xml}");
    assert_eq!(xml.matches("<w:drawing>").count(), 1);

    let media = part(&out, "word/media/vlf_image1.png").unwrap();
    assert_eq!(image::load_from_memory(&media).unwrap().width(), 60);

    let rels = part_text(&out, "word/_rels/document.xml.rels");
    assert!(rels.contains(r#"Id="rIdVlf1""#));
    assert!(rels.contains(r#"Target="media/vlf_image1.png""#));

    let types = part_text(&out, "[Content_Types].xml");
    assert!(types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
}

#[test]
fn keeps_existing_relationships() {
    let rels = r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="styles" Target="styles.xml"/></Relationships>"#;
    let docx = template(&[
        ("word/document.xml", &document(&paragraph("{{ img }}"))),
        ("word/_rels/document.xml.rels", rels),
    ]);
    let mut context = RenderContext::new();
    context.insert(
        "img",
        ContextEntry::Image(ImageArtifact {
            bytes: png(4, 4),
            width_cm: 14.0,
        }),
    );

    let out = renderer().render_docx(&docx, &context).unwrap();
    let rels = part_text(&out, "word/_rels/document.xml.rels");
    assert!(rels.contains(r#"Id="rId1""#));
    assert!(rels.contains(r#"Id="rIdVlf1""#));
}

#[test]
fn unknown_key_is_an_error() {
    let docx = template(&[("word/document.xml", &document(&paragraph("{{ inventado }}")))]);
    let err = renderer().render_docx(&docx, &RenderContext::new()).unwrap_err();
    assert!(matches!(err, DocxError::MissingKey(ref key) if key == "inventado"), "{err}");
}

#[test]
fn undecodable_image_is_an_error() {
    let docx = template(&[("word/document.xml", &document(&paragraph("{{ foto }}")))]);
    let mut context = RenderContext::new();
    context.insert(
        "foto",
        ContextEntry::Image(ImageArtifact {
            bytes: b"not an image".to_vec(),
            width_cm: 14.0,
        }),
    );
    let err = renderer().render_docx(&docx, &context).unwrap_err();
    assert!(matches!(err, DocxError::Image { ref key, .. } if key == "foto"), "{err}");
}

#[test]
fn package_without_document_is_rejected() {
    let docx = template(&[("word/styles.xml", "<w:styles/>")]);
    let err = renderer().render_docx(&docx, &RenderContext::new()).unwrap_err();
    assert!(matches!(err, DocxError::MissingPart(_)));
}

#[test]
fn renders_through_the_report_renderer_trait() {
    let docx = template(&[("word/document.xml", &document(&paragraph("{{ x }}")))]);
    let handle = TemplateHandle::new(TemplateId::new("templateVLF1FS1TR"), docx);
    let mut context = RenderContext::new();
    context.insert("x", ContextEntry::Value(json!("ok")));
    let out = ReportRenderer::render(&renderer(), &handle, &context).unwrap();
    assert!(part_text(&out, "word/document.xml").contains(">ok<"));
}
