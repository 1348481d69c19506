//! Non-interactive runs: answers from a JSON file, photos from a directory.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;
use vlf_io::{IoError, scan_uploads};
use vlf_wizard::{
    AdvanceError, Answers, FieldKind, FieldSpec, SessionError, Step, TemplateStore, Wizard,
};

/// Errors from a batch run.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// An answer was rejected by the form.
    #[error("answer for `{key}` rejected: {source}")]
    Answer {
        /// Field key.
        key: String,
        /// Rejection reason.
        #[source]
        source: SessionError,
    },

    /// A step could not be completed.
    #[error(transparent)]
    Advance(#[from] AdvanceError),

    /// Photos could not be read.
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Convert a file answer to the value a field expects.
///
/// Strings are parsed like typed input, so `"4,65"` fills a numeric field
/// and `"urbano"` a choice. Numbers fill text fields as their decimal form.
fn coerce(spec: &FieldSpec, value: &Value) -> Result<Value, SessionError> {
    match value {
        Value::String(raw) if !spec.kind.accepts(value) => spec.kind.parse_input(&spec.key, raw),
        Value::Number(n) if matches!(spec.kind, FieldKind::ShortText | FieldKind::LongText) => {
            Ok(Value::String(n.to_string()))
        }
        _ => Ok(value.clone()),
    }
}

fn is_blank(value: &Value) -> bool {
    value.is_null() || value.as_str().is_some_and(|s| s.trim().is_empty())
}

/// Walk `wizard` from its current step to the last, answering from
/// `answers` and attaching photos found in `uploads`.
///
/// Answers for keys that are not part of the form are logged and skipped.
///
/// # Errors
///
/// Returns [`BatchError`] on the first rejected answer or step.
pub fn fill<T: TemplateStore>(
    wizard: &mut Wizard<T>,
    answers: &Answers,
    uploads: Option<&Path>,
) -> Result<(), BatchError> {
    let mut used = BTreeSet::new();
    loop {
        let step = wizard.step();
        let fields = wizard.current_fields();
        for spec in fields.iter().filter(|f| f.kind != FieldKind::PhotoUpload) {
            let Some(value) = answers.get(&spec.key).filter(|v| !is_blank(v)) else {
                continue;
            };
            let answer = |source| BatchError::Answer {
                key: spec.key.clone(),
                source,
            };
            let value = coerce(spec, value).map_err(answer)?;
            wizard.set(&spec.key, value).map_err(answer)?;
            used.insert(spec.key.clone());
        }

        if step == Step::LAST {
            if let Some(dir) = uploads {
                let slots = fields
                    .iter()
                    .filter(|f| f.kind == FieldKind::PhotoUpload)
                    .map(|f| f.key.clone());
                for (key, upload) in scan_uploads(dir, slots)? {
                    wizard
                        .attach_upload(&key, upload)
                        .map_err(|source| BatchError::Answer { key, source })?;
                }
            }
            wizard.advance()?;
            break;
        }
        wizard.advance()?;
    }

    for (key, _) in answers.iter().filter(|(key, _)| !used.contains(*key)) {
        tracing::warn!(%key, "answer ignored: not a field of this form");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use vlf_wizard::{MemoryTemplateStore, SegmentType, StepError, resolve};

    use super::*;

    fn answers(overrides: &[(&str, Value)]) -> Answers {
        let mut answers: Answers = [
            ("nombreProyecto", json!("Subestación Norte")),
            ("nombreCiudadoMunicipio", json!("Bogotá")),
            ("nombreDepartamento", json!("Cundinamarca")),
            ("nombreCompleto", json!("Ana Pérez")),
            ("nroConteoTarjeta", json!(12345)),
            ("nombreCargo", json!("Ingeniera")),
            ("fechaCreacion", json!("2024-03-15")),
            ("direccion", json!("Calle 1 # 2-3")),
            ("tensionPrueba", json!("aceptación")),
            ("tipoTramos", json!("Monofásicos")),
            ("cantidadTramos", json!("1")),
            ("tipoCoordenada", json!("Urbano")),
            ("latitud", json!("4,6097")),
            ("longitud", json!("-74.0817")),
            ("caracteristicasCable", json!("XLPE 15 kV")),
            ("fechaCalibracion", json!("2024-01-10")),
            ("frmVerfCabPreg1", json!("Sí")),
            ("frmVerfCabPreg2", json!("Sí")),
            ("frmVerfCabPreg3", json!("Sí")),
            ("frmVerfCabPreg4", json!("No")),
            ("frmVerfCabPreg5", json!("Sí")),
            ("frmVerfCabPreg6", json!("Sí")),
            ("descripcionTramo_Trm1", json!("Acometida")),
            ("nombreCircuito", json!("ignored")),
            ("nombreCircuitoTrm1", json!("C-12")),
            ("corrienteTramoTrm1", json!("4,65")),
            ("distanciaCableTrm1", json!(120)),
            ("evaluacionFinalTrm1", json!("CUMPLE")),
        ]
        .into_iter()
        .collect();
        for (key, value) in overrides {
            answers.insert(*key, value.clone());
        }
        answers
    }

    fn store() -> MemoryTemplateStore {
        let id = resolve(SegmentType::SinglePhase, 1);
        MemoryTemplateStore::new().with(id, b"template".to_vec())
    }

    #[test]
    fn fills_every_step() {
        let mut wizard = Wizard::new(store());
        fill(&mut wizard, &answers(&[]), None).unwrap();
        assert_eq!(wizard.step(), Step::Media);
        let session = wizard.session();
        assert_eq!(session.get("nroConteoTarjeta"), Some(&json!("12345")));
        assert_eq!(session.get("tensionPrueba"), Some(&json!("Aceptación")));
        assert_eq!(session.get("cantidadTramos"), Some(&json!(1)));
        assert_eq!(session.get("corrienteTramoTrm1"), Some(&json!(4.65)));
        assert!(session.get("nombreCircuito").is_none());
    }

    #[test]
    fn missing_answer_stops_at_its_step() {
        let mut wizard = Wizard::new(store());
        let err = fill(&mut wizard, &answers(&[("caracteristicasCable", json!(" "))]), None).unwrap_err();
        assert!(matches!(
            err,
            BatchError::Advance(AdvanceError::Incomplete {
                step: Step::Technical,
                source: StepError::Missing { .. },
            })
        ));
        assert_eq!(wizard.step(), Step::Technical);
    }

    #[test]
    fn wrong_kind_names_the_field() {
        let mut wizard = Wizard::new(store());
        let err = fill(&mut wizard, &answers(&[("corrienteTramoTrm1", json!("mucha"))]), None).unwrap_err();
        assert!(matches!(err, BatchError::Answer { ref key, .. } if key == "corrienteTramoTrm1"));
    }

    #[test]
    fn photos_are_attached_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut jpeg = Vec::new();
        image::RgbImage::new(8, 6)
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();
        std::fs::write(dir.path().join("imgPruebaTramoTrm1.jpg"), &jpeg).unwrap();
        let mut wizard = Wizard::new(store());
        fill(&mut wizard, &answers(&[]), Some(dir.path())).unwrap();
        let uploads = wizard.session().uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads["imgPruebaTramoTrm1"].file_name, "imgPruebaTramoTrm1.jpg");
    }

    #[test]
    fn unreadable_photo_is_rejected_before_rendering() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("imgPruebaTramoTrm1.jpg"), b"jpeg").unwrap();
        let mut wizard = Wizard::new(store());
        let err = fill(&mut wizard, &answers(&[]), Some(dir.path())).unwrap_err();
        assert!(matches!(err, BatchError::Io(IoError::NotAnImage { .. })));
        assert!(wizard.session().uploads().is_empty());
    }
}
