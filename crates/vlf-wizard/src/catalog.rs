//! Field catalog: which fields exist on each step.
//!
//! Steps 1-3 are fixed. Steps 4 and 5 are generated from the
//! [`SegmentPlan`] implied by the step-2 answers, so the catalog is always
//! queried together with the answers collected so far.

use serde::Serialize;
use serde_json::Value;

use crate::session::Answers;
use crate::types::{CoordinateMode, Phase, SegmentCountError, SegmentType, SessionError, Step, TestVoltage};

/// Keys of the fixed fields and of the keys the report context adds.
pub mod keys {
    /// Project name.
    pub const PROJECT_NAME: &str = "nombreProyecto";
    /// City or municipality.
    pub const CITY: &str = "nombreCiudadoMunicipio";
    /// Department (region).
    pub const DEPARTMENT: &str = "nombreDepartamento";
    /// Inspector full name.
    pub const FULL_NAME: &str = "nombreCompleto";
    /// Professional card number.
    pub const LICENSE_NUMBER: &str = "nroConteoTarjeta";
    /// Inspector position.
    pub const POSITION: &str = "nombreCargo";
    /// Report creation date.
    pub const CREATED_ON: &str = "fechaCreacion";
    /// Site address.
    pub const ADDRESS: &str = "direccion";

    /// Test voltage category.
    pub const TEST_VOLTAGE: &str = "tensionPrueba";
    /// Segment type.
    pub const SEGMENT_TYPE: &str = "tipoTramos";
    /// Segment count.
    pub const SEGMENT_COUNT: &str = "cantidadTramos";
    /// Coordinate-image mode.
    pub const COORDINATE_MODE: &str = "tipoCoordenada";
    /// Latitude text.
    pub const LATITUDE: &str = "latitud";
    /// Longitude text.
    pub const LONGITUDE: &str = "longitud";
    /// Cable characteristics.
    pub const CABLE_SPEC: &str = "caracteristicasCable";
    /// Test equipment calibration date.
    pub const CALIBRATED_ON: &str = "fechaCalibracion";

    /// Checklist comments.
    pub const CHECKLIST_COMMENTS: &str = "comVerificacion";

    /// Derived numeric test voltage magnitude.
    pub const TEST_VOLTAGE_MAGNITUDE: &str = "valTensionPrueba";
    /// Location map image.
    pub const MAP_IMAGE: &str = "imgMapsProyecto";
    /// Voltage reference table image.
    pub const VOLTAGE_REFERENCE_IMAGE: &str = "imgTablaTensionPrueba";
    /// Render day of month.
    pub const DAY: &str = "dia";
    /// Render month name.
    pub const MONTH: &str = "mes";
    /// Render year.
    pub const YEAR: &str = "anio";
}

/// Labels of the six yes/no checklist questions, keyed in order.
pub const CHECKLIST_QUESTIONS: [(&str, &str); 6] = [
    ("frmVerfCabPreg1", "Revisión visual del aislamiento del cable"),
    ("frmVerfCabPreg2", "Prueba de continuidad eléctrica"),
    ("frmVerfCabPreg3", "Verificación de conexiones seguras"),
    ("frmVerfCabPreg4", "Inspección de presencia de oxidación o corrosión"),
    ("frmVerfCabPreg5", "Confirmación de identificación correcta del circuito"),
    ("frmVerfCabPreg6", "Chequeo de integridad mecánica del tramo"),
];

const YES_NO: &[&str] = &["Sí", "No"];
const EVALUATION: &[&str] = &["CUMPLE", "NO CUMPLE"];

/// The kind of value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FieldKind {
    /// Single-line free text.
    ShortText,
    /// Multi-line free text.
    LongText,
    /// Exactly one of a fixed list of options.
    Choice(&'static [&'static str]),
    /// A number, optionally bounded (inclusive).
    Numeric {
        /// Inclusive lower bound.
        min: Option<f64>,
        /// Inclusive upper bound.
        max: Option<f64>,
        /// Whether the value must be a whole number.
        integer: bool,
    },
    /// A calendar date written as `AAAA-MM-DD`.
    Date,
    /// A per-segment photo upload slot.
    PhotoUpload,
}

impl FieldKind {
    const fn unbounded_number() -> Self {
        Self::Numeric {
            min: None,
            max: None,
            integer: false,
        }
    }

    /// Whether `value` has the right shape for this kind.
    ///
    /// Bounds are not checked here; they belong to step validation,
    /// since a bound may depend on answers given later.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::ShortText | Self::LongText | Self::Date => value.is_string(),
            Self::Choice(options) => value.as_str().is_some_and(|s| options.contains(&s)),
            Self::Numeric { .. } => value.is_number(),
            Self::PhotoUpload => false,
        }
    }

    /// Human-readable description of accepted values, for error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ShortText | Self::LongText => "text".to_string(),
            Self::Date => "a date (AAAA-MM-DD)".to_string(),
            Self::Choice(options) => format!("one of: {}", options.join(", ")),
            Self::Numeric { integer: true, .. } => "a whole number".to_string(),
            Self::Numeric { .. } => "a number".to_string(),
            Self::PhotoUpload => "an uploaded image".to_string(),
        }
    }

    /// Convert raw typed input into a value of this kind.
    ///
    /// Numbers accept a comma as decimal separator. Choices match an
    /// option exactly, or case-insensitively when that is unambiguous.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongKind`] naming `key` when the input
    /// cannot be converted.
    pub fn parse_input(&self, key: &str, raw: &str) -> Result<Value, SessionError> {
        let wrong = || SessionError::WrongKind {
            key: key.to_string(),
            expected: self.describe(),
        };
        match self {
            Self::ShortText | Self::LongText | Self::Date => Ok(Value::String(raw.trim().to_string())),
            Self::Choice(options) => {
                let raw = raw.trim();
                if let Some(exact) = options.iter().find(|o| **o == raw) {
                    return Ok(Value::String((*exact).to_string()));
                }
                let lowered = raw.to_lowercase();
                let mut matches = options.iter().filter(|o| o.to_lowercase() == lowered);
                match (matches.next(), matches.next()) {
                    (Some(only), None) => Ok(Value::String((*only).to_string())),
                    _ => Err(wrong()),
                }
            }
            Self::Numeric { integer, .. } => {
                let number = crate::coords::parse_decimal(raw).ok_or_else(wrong)?;
                if *integer {
                    if number.fract() != 0.0 || number < 0.0 {
                        return Err(wrong());
                    }
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let whole = number as u64;
                    return Ok(Value::from(whole));
                }
                serde_json::Number::from_f64(number)
                    .map(Value::Number)
                    .ok_or_else(wrong)
            }
            Self::PhotoUpload => Err(wrong()),
        }
    }
}

/// One answerable field of the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Answer key, unique within its step.
    pub key: String,
    /// Step the field belongs to.
    pub step: Step,
    /// Accepted value kind.
    pub kind: FieldKind,
    /// Whether the step cannot be left while this field is empty.
    pub required: bool,
    /// Prompt text.
    pub label: String,
    /// Segment and phase for dynamically generated fields.
    pub segment: Option<SegmentSlot>,
}

impl FieldSpec {
    fn fixed(step: Step, key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            step,
            kind,
            required: true,
            label: label.to_string(),
            segment: None,
        }
    }

    const fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// One (segment index, phase) pair of a [`SegmentPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SegmentSlot {
    /// One-based segment index.
    pub index: u32,
    /// Phase of the segment.
    pub phase: Phase,
}

impl SegmentSlot {
    /// Key suffix shared by every field of this slot, e.g. `Trm2B` or `Trm3`.
    #[must_use]
    pub fn suffix(self) -> String {
        format!("Trm{}{}", self.index, self.phase.letter())
    }

    /// Heading used when prompting for this slot.
    #[must_use]
    pub fn heading(self) -> String {
        format!("Tramo {} Fase {}", self.index, self.phase.display_name())
    }
}

/// Template for a field generated once per [`SegmentSlot`].
#[derive(Debug, Clone, Copy)]
pub struct SlotField {
    /// Key prefix; the slot suffix is appended to it.
    pub prefix: &'static str,
    /// Prompt label prefix.
    pub label: &'static str,
    /// Accepted value kind.
    pub kind: FieldKind,
    /// Whether the field is required.
    pub required: bool,
}

impl SlotField {
    /// Key of this field for `slot`.
    #[must_use]
    pub fn key(&self, slot: SegmentSlot) -> String {
        format!("{}{}", self.prefix, slot.suffix())
    }

    fn spec(&self, step: Step, slot: SegmentSlot) -> FieldSpec {
        FieldSpec {
            key: self.key(slot),
            step,
            kind: self.kind,
            required: self.required,
            label: format!("{} {}", self.label, slot.suffix()),
            segment: Some(slot),
        }
    }
}

/// Per-slot measurement fields of step 4, in prompt order.
pub const MEASUREMENT_FIELDS: [SlotField; 5] = [
    SlotField {
        prefix: "descripcionTramo_",
        label: "Descripción",
        kind: FieldKind::ShortText,
        required: true,
    },
    SlotField {
        prefix: "nombreCircuito",
        label: "Nombre del Circuito",
        kind: FieldKind::ShortText,
        required: true,
    },
    SlotField {
        prefix: "corrienteTramo",
        label: "Corriente del Tramo",
        kind: FieldKind::unbounded_number(),
        required: true,
    },
    SlotField {
        prefix: "distanciaCable",
        label: "Distancia del Cable",
        kind: FieldKind::unbounded_number(),
        required: true,
    },
    SlotField {
        prefix: "evaluacionFinal",
        label: "Evaluación Final",
        kind: FieldKind::Choice(EVALUATION),
        required: true,
    },
];

/// Per-slot photo field of step 5.
pub const PHOTO_FIELD: SlotField = SlotField {
    prefix: "imgPruebaTramo",
    label: "Imagen para Tramo",
    kind: FieldKind::PhotoUpload,
    required: false,
};

/// Ordered (segment, phase) pairs derived from the segment configuration.
///
/// A pure function of `(segment_type, count)`: equal inputs always give
/// equal slot lists, so two sessions with the same answers share one key set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentPlan {
    segment_type: SegmentType,
    count: u32,
    slots: Vec<SegmentSlot>,
}

impl SegmentPlan {
    /// Build the plan for `count` segments of `segment_type`.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentCountError`] if `count` is zero or exceeds
    /// [`SegmentType::max_segments`].
    pub fn new(segment_type: SegmentType, count: u32) -> Result<Self, SegmentCountError> {
        let max = segment_type.max_segments();
        if count == 0 || count > max {
            return Err(SegmentCountError {
                segment_type,
                count,
                max,
            });
        }
        let slots = (1..=count)
            .flat_map(|index| {
                segment_type
                    .phases()
                    .iter()
                    .map(move |&phase| SegmentSlot { index, phase })
            })
            .collect();
        Ok(Self {
            segment_type,
            count,
            slots,
        })
    }

    /// Derive the plan from collected answers.
    ///
    /// Returns `Ok(None)` while the segment type or count is not yet
    /// answered (or not a recognised option / whole number).
    ///
    /// # Errors
    ///
    /// Returns [`SegmentCountError`] if both are answered but the count is
    /// out of bounds.
    pub fn from_answers(answers: &Answers) -> Result<Option<Self>, SegmentCountError> {
        let Some(segment_type) = segment_type(answers) else {
            return Ok(None);
        };
        let Some(count) = answers.get(keys::SEGMENT_COUNT).and_then(Value::as_u64) else {
            return Ok(None);
        };
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        Self::new(segment_type, count).map(Some)
    }

    /// The segment type the plan was built for.
    #[must_use]
    pub const fn segment_type(&self) -> SegmentType {
        self.segment_type
    }

    /// Number of physical segments.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Every (segment, phase) slot, segment-major.
    #[must_use]
    pub fn slots(&self) -> &[SegmentSlot] {
        &self.slots
    }

    /// Photo slot keys, one per slot.
    pub fn photo_keys(&self) -> impl Iterator<Item = String> + '_ {
        self.slots.iter().map(|&slot| PHOTO_FIELD.key(slot))
    }
}

/// Parse the segment type answer, if set to a known option.
#[must_use]
pub fn segment_type(answers: &Answers) -> Option<SegmentType> {
    answers.get_str(keys::SEGMENT_TYPE).and_then(SegmentType::from_label)
}

/// Parse the test voltage answer, if set to a known option.
#[must_use]
pub fn test_voltage(answers: &Answers) -> Option<TestVoltage> {
    answers.get_str(keys::TEST_VOLTAGE).and_then(TestVoltage::from_label)
}

/// Parse the coordinate-image mode answer, if set to a known option.
#[must_use]
pub fn coordinate_mode(answers: &Answers) -> Option<CoordinateMode> {
    answers.get_str(keys::COORDINATE_MODE).and_then(CoordinateMode::from_label)
}

/// Fields of `step`, in prompt order, given the answers collected so far.
///
/// Steps 4 and 5 are empty until step 2 yields a valid [`SegmentPlan`].
#[must_use]
pub fn fields_for_step(step: Step, answers: &Answers) -> Vec<FieldSpec> {
    match step {
        Step::GeneralInfo => general_info_fields(),
        Step::Technical => technical_fields(answers),
        Step::Checklist => checklist_fields(),
        Step::Segments => plan_fields(answers, Step::Segments, &MEASUREMENT_FIELDS),
        Step::Media => plan_fields(answers, Step::Media, &[PHOTO_FIELD]),
    }
}

/// Find the field `key` on any step.
#[must_use]
pub fn find_field(key: &str, answers: &Answers) -> Option<FieldSpec> {
    Step::ALL
        .into_iter()
        .flat_map(|step| fields_for_step(step, answers))
        .find(|spec| spec.key == key)
}

fn general_info_fields() -> Vec<FieldSpec> {
    let step = Step::GeneralInfo;
    vec![
        FieldSpec::fixed(step, keys::PROJECT_NAME, "Nombre del Proyecto", FieldKind::ShortText),
        FieldSpec::fixed(step, keys::CITY, "Ciudad o Municipio", FieldKind::ShortText),
        FieldSpec::fixed(step, keys::DEPARTMENT, "Departamento", FieldKind::ShortText),
        FieldSpec::fixed(step, keys::FULL_NAME, "Nombre Completo", FieldKind::ShortText),
        FieldSpec::fixed(
            step,
            keys::LICENSE_NUMBER,
            "Número de CONTE o Tarjeta Profesional",
            FieldKind::ShortText,
        ),
        FieldSpec::fixed(step, keys::POSITION, "Nombre del Cargo", FieldKind::ShortText),
        FieldSpec::fixed(step, keys::CREATED_ON, "Fecha de Creación (AAAA-MM-DD)", FieldKind::Date),
        FieldSpec::fixed(step, keys::ADDRESS, "Dirección", FieldKind::ShortText),
    ]
}

fn technical_fields(answers: &Answers) -> Vec<FieldSpec> {
    let step = Step::Technical;
    let max = segment_type(answers).map(|t| f64::from(t.max_segments()));
    vec![
        FieldSpec::fixed(
            step,
            keys::TEST_VOLTAGE,
            "Tensión de Prueba",
            FieldKind::Choice(TestVoltage::OPTIONS),
        ),
        FieldSpec::fixed(
            step,
            keys::SEGMENT_TYPE,
            "Tipo de Tramos",
            FieldKind::Choice(SegmentType::OPTIONS),
        ),
        FieldSpec::fixed(
            step,
            keys::SEGMENT_COUNT,
            "Cantidad de Tramos",
            FieldKind::Numeric {
                min: Some(1.0),
                max,
                integer: true,
            },
        ),
        FieldSpec::fixed(
            step,
            keys::COORDINATE_MODE,
            "Tipo de Coordenada",
            FieldKind::Choice(CoordinateMode::OPTIONS),
        ),
        FieldSpec::fixed(step, keys::LATITUDE, "Latitud", FieldKind::ShortText),
        FieldSpec::fixed(step, keys::LONGITUDE, "Longitud", FieldKind::ShortText),
        FieldSpec::fixed(step, keys::CABLE_SPEC, "Características del Cable", FieldKind::ShortText),
        FieldSpec::fixed(
            step,
            keys::CALIBRATED_ON,
            "Fecha de Calibración (AAAA-MM-DD)",
            FieldKind::Date,
        ),
    ]
}

fn checklist_fields() -> Vec<FieldSpec> {
    let step = Step::Checklist;
    CHECKLIST_QUESTIONS
        .iter()
        .map(|(key, label)| FieldSpec::fixed(step, key, label, FieldKind::Choice(YES_NO)))
        .chain(std::iter::once(
            FieldSpec::fixed(
                step,
                keys::CHECKLIST_COMMENTS,
                "Comentarios de Verificación",
                FieldKind::LongText,
            )
            .optional(),
        ))
        .collect()
}

fn plan_fields(answers: &Answers, step: Step, templates: &[SlotField]) -> Vec<FieldSpec> {
    let Ok(Some(plan)) = SegmentPlan::from_answers(answers) else {
        return Vec::new();
    };
    plan.slots()
        .iter()
        .flat_map(|&slot| templates.iter().map(move |t| t.spec(step, slot)))
        .collect()
}
