//! Shared types for the VLF report wizard.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::template::TemplateId;

/// One of the five wizard steps, in the order they are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    /// Step 1: project, location and inspector identification.
    GeneralInfo,
    /// Step 2: test voltage, segment configuration and coordinates.
    Technical,
    /// Step 3: cable verification checklist.
    Checklist,
    /// Step 4: per-segment measurements.
    Segments,
    /// Step 5: photo uploads and report generation.
    Media,
}

impl Step {
    /// All steps in wizard order.
    pub const ALL: [Self; 5] = [
        Self::GeneralInfo,
        Self::Technical,
        Self::Checklist,
        Self::Segments,
        Self::Media,
    ];

    /// The first step of every session.
    pub const FIRST: Self = Self::GeneralInfo;

    /// The terminal step. Reaching it does not prevent going back.
    pub const LAST: Self = Self::Media;

    /// One-based step number (1 through 5).
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::GeneralInfo => 1,
            Self::Technical => 2,
            Self::Checklist => 3,
            Self::Segments => 4,
            Self::Media => 5,
        }
    }

    /// Look up a step by its one-based number.
    ///
    /// Returns `None` for numbers outside `1..=5`.
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::GeneralInfo),
            2 => Some(Self::Technical),
            3 => Some(Self::Checklist),
            4 => Some(Self::Segments),
            5 => Some(Self::Media),
            _ => None,
        }
    }

    /// The following step, or `None` at the terminal step.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// The preceding step, or `None` at the first step.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        Self::from_number(self.number() - 1)
    }

    /// Section heading shown to the user.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::GeneralInfo => "Información General",
            Self::Technical => "Datos Técnicos",
            Self::Checklist => "Formulario de Verificación del Cable",
            Self::Segments => "Detalles por Tramo",
            Self::Media => "Subida de Imágenes de Pruebas y Mapa",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {} ({})", self.number(), self.title())
    }
}

/// How many phases each tested cable segment has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentType {
    /// Three-phase segments, one sub-form per phase A, B and C.
    ThreePhase,
    /// Single-phase segments, one unlabeled sub-form each.
    SinglePhase,
}

impl SegmentType {
    /// Option labels in the order the form offers them.
    pub const OPTIONS: &'static [&'static str] = &["Trifásicos", "Monofásicos"];

    /// The form option text for this type.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ThreePhase => "Trifásicos",
            Self::SinglePhase => "Monofásicos",
        }
    }

    /// Parse the form option text.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Trifásicos" => Some(Self::ThreePhase),
            "Monofásicos" => Some(Self::SinglePhase),
            _ => None,
        }
    }

    /// Upper bound on the number of segments a single report can hold.
    #[must_use]
    pub const fn max_segments(self) -> u32 {
        match self {
            Self::ThreePhase => 10,
            Self::SinglePhase => 20,
        }
    }

    /// Phases generated for every segment of this type.
    #[must_use]
    pub const fn phases(self) -> &'static [Phase] {
        match self {
            Self::ThreePhase => &[Phase::A, Phase::B, Phase::C],
            Self::SinglePhase => &[Phase::Single],
        }
    }

    /// Phase-count digit used in template identifiers.
    #[must_use]
    pub const fn phase_code(self) -> u8 {
        match self {
            Self::ThreePhase => 3,
            Self::SinglePhase => 1,
        }
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Phase label of one segment sub-form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Phase A of a three-phase segment.
    A,
    /// Phase B of a three-phase segment.
    B,
    /// Phase C of a three-phase segment.
    C,
    /// The only phase of a single-phase segment (no label).
    Single,
}

impl Phase {
    /// Letter appended to generated keys. Empty for [`Phase::Single`].
    #[must_use]
    pub const fn letter(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::Single => "",
        }
    }

    /// Name shown in prompts.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Single => "Única",
            other => other.letter(),
        }
    }
}

/// Test voltage category selected on step 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestVoltage {
    /// Acceptance test of new cable.
    Acceptance,
    /// Maintenance test of cable in service.
    Maintenance,
}

impl TestVoltage {
    /// Option labels in the order the form offers them.
    pub const OPTIONS: &'static [&'static str] = &["Aceptación", "Mantenimiento"];

    /// The form option text for this category.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Acceptance => "Aceptación",
            Self::Maintenance => "Mantenimiento",
        }
    }

    /// Parse the form option text.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Aceptación" => Some(Self::Acceptance),
            "Mantenimiento" => Some(Self::Maintenance),
            _ => None,
        }
    }

    /// Numeric test voltage magnitude written into the report.
    #[must_use]
    pub const fn magnitude(self) -> u32 {
        match self {
            Self::Acceptance => 21,
            Self::Maintenance => 16,
        }
    }

    /// File name of the static voltage reference table image.
    #[must_use]
    pub const fn reference_asset(self) -> &'static str {
        match self {
            Self::Acceptance => "imgAceptacion.png",
            Self::Maintenance => "imgMantenimiento.png",
        }
    }
}

/// Which kind of location map the report embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateMode {
    /// Lightweight street map with a circle marker.
    Urban,
    /// Satellite basemap around the point.
    Rural,
}

impl CoordinateMode {
    /// Option labels in the order the form offers them.
    pub const OPTIONS: &'static [&'static str] = &["Urbano", "Rural"];

    /// Parse the form option text.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Urbano" => Some(Self::Urban),
            "Rural" => Some(Self::Rural),
            _ => None,
        }
    }
}

/// A photo supplied by the user for one segment slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original file name, kept for logging.
    pub file_name: String,
    /// Encoded image bytes (PNG or JPEG).
    pub bytes: Vec<u8>,
}

/// Setting a value on the session failed. The session is unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The key is not part of the form for the current answers.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// The value does not match the field's kind.
    #[error("invalid value for `{key}`: expected {expected}")]
    WrongKind {
        /// Field key.
        key: String,
        /// Human-readable description of the accepted values.
        expected: String,
    },

    /// The field belongs to a different step than the one being edited.
    #[error("field `{key}` belongs to {field_step}, not {current}")]
    NotOnStep {
        /// Field key.
        key: String,
        /// Step the field belongs to.
        field_step: Step,
        /// Step currently shown.
        current: Step,
    },
}

/// The current step cannot be left because its answers are incomplete.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    /// Required fields are absent or empty.
    #[error("missing required fields: {}", .keys.join(", "))]
    Missing {
        /// Keys of every missing field, in catalog order.
        keys: Vec<String>,
    },

    /// A numeric answer lies outside the bounds of its field.
    #[error("`{key}` = {value} is outside {min}..={max}")]
    OutOfRange {
        /// Field key.
        key: String,
        /// Offending value.
        value: f64,
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },

    /// A count field holds a fractional number.
    #[error("`{key}` = {value} must be a whole number")]
    NotInteger {
        /// Field key.
        key: String,
        /// Offending value.
        value: f64,
    },
}

/// A segment count does not fit the bound of its segment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{segment_type} reports hold 1..={max} segments, got {count}")]
pub struct SegmentCountError {
    /// Segment type the count was given for.
    pub segment_type: SegmentType,
    /// Rejected count.
    pub count: u32,
    /// Upper bound for this type.
    pub max: u32,
}

/// Loading a template resource failed.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// No template exists for the identifier.
    #[error("template not found: {0}")]
    NotFound(TemplateId),

    /// The template exists but could not be read.
    #[error("failed to read template {id}: {source}")]
    Io {
        /// Identifier being loaded.
        id: TemplateId,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Advancing the wizard was rejected. The step did not change.
#[derive(Debug, thiserror::Error)]
pub enum AdvanceError {
    /// The current step has missing or invalid answers.
    #[error("cannot leave {step}: {source}")]
    Incomplete {
        /// Step that failed validation.
        step: Step,
        /// Validation failure.
        #[source]
        source: StepError,
    },

    /// No template exists for the chosen segment configuration.
    #[error("no report template for this segment configuration: {0}")]
    TemplateNotFound(TemplateId),

    /// The template store failed for a reason other than absence.
    #[error(transparent)]
    TemplateStore(TemplateError),
}

/// Building or rendering the report failed.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Reports are generated from the last step only.
    #[error("reports can only be generated from step 5, currently at {0}")]
    NotAtFinalStep(Step),

    /// The segment configuration no longer yields a valid plan.
    #[error(transparent)]
    SegmentCount(#[from] SegmentCountError),

    /// The template loaded on step 2 is missing.
    #[error("no template loaded; revisit step 2")]
    TemplateNotLoaded,

    /// The document renderer rejected the template/context pair.
    #[error("document renderer failed: {0}")]
    Renderer(String),
}
