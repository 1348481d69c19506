//! Report context assembly.
//!
//! Turns a snapshot of the answers into the flat key/value context a
//! [`ReportRenderer`](crate::wizard::ReportRenderer) fills the template
//! with. Every enrichment step is independent: a location map that cannot
//! be produced is recorded as an [`AssemblyNote`] and the rest of the
//! context is still built.
//!
//! Every form field and image slot has an entry, so a template never
//! refers to a key the context lacks: unanswered fields are `""` and
//! images that could not be produced are [`ContextEntry::NoImage`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::calendar::{Clock, date_parts};
use crate::catalog::{self, FieldKind, SegmentPlan, keys};
use crate::coords::{self, Axis, CoordinateError, LonLat};
use crate::session::Answers;
use crate::types::{CoordinateMode, Step, Upload};

/// Uppercase every string inside `value`.
///
/// Object values and array elements are visited recursively; object keys
/// and non-string scalars are left as they are. Applying it twice gives
/// the same result as applying it once.
#[must_use]
pub fn uppercase_strings(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.to_uppercase()),
        Value::Array(items) => Value::Array(items.iter().map(uppercase_strings).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), uppercase_strings(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// An encoded image with the width it should occupy on the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageArtifact {
    /// PNG or JPEG bytes.
    #[serde(serialize_with = "byte_len")]
    pub bytes: Vec<u8>,
    /// Printed width in centimetres. Height follows the aspect ratio.
    pub width_cm: f64,
}

fn byte_len<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(bytes.len() as u64)
}

/// One value of the render context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ContextEntry {
    /// Text or number substituted as-is.
    Value(Value),
    /// An image embedded inline.
    Image(ImageArtifact),
    /// An image slot with nothing to show. Renders as nothing.
    NoImage,
}

/// Something the assembler had to leave out.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
pub enum AssemblyNote {
    /// A coordinate could not be parsed or is out of range.
    #[error("{axis} {raw:?} is not a usable coordinate; location map omitted")]
    MalformedCoordinate {
        /// Which coordinate.
        axis: Axis,
        /// Offending input.
        raw: String,
    },

    /// A coordinate was not given.
    #[error("no {0} given; location map omitted")]
    MissingCoordinates(Axis),

    /// The map collaborator failed.
    #[error("{mode:?} location map unavailable: {reason}")]
    MapUnavailable {
        /// Which map was requested.
        mode: CoordinateMode,
        /// Collaborator error message.
        reason: String,
    },
}

impl From<CoordinateError> for AssemblyNote {
    fn from(err: CoordinateError) -> Self {
        match err {
            CoordinateError::Missing(axis) => Self::MissingCoordinates(axis),
            CoordinateError::Malformed { axis, raw } => Self::MalformedCoordinate { axis, raw },
            CoordinateError::OutOfRange { axis, value } => Self::MalformedCoordinate {
                axis,
                raw: value.to_string(),
            },
        }
    }
}

/// Everything a renderer needs to fill a template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderContext {
    entries: BTreeMap<String, ContextEntry>,
    notes: Vec<AssemblyNote>,
}

impl RenderContext {
    /// An empty context.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            notes: Vec::new(),
        }
    }

    /// The entry under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextEntry> {
        self.entries.get(key)
    }

    /// The plain value under `key`, if the entry is not an image.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        match self.entries.get(key)? {
            ContextEntry::Value(v) => Some(v),
            ContextEntry::Image(_) | ContextEntry::NoImage => None,
        }
    }

    /// The image under `key`, if any.
    #[must_use]
    pub fn image(&self, key: &str) -> Option<&ImageArtifact> {
        match self.entries.get(key)? {
            ContextEntry::Image(image) => Some(image),
            ContextEntry::Value(_) | ContextEntry::NoImage => None,
        }
    }

    /// Whether `key` has an entry.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, key: impl Into<String>, entry: ContextEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContextEntry)> {
        self.entries.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Degradations recorded while assembling.
    #[must_use]
    pub fn notes(&self) -> &[AssemblyNote] {
        &self.notes
    }

    fn note(&mut self, note: AssemblyNote) {
        tracing::warn!(%note, "report context degraded");
        self.notes.push(note);
    }
}

/// A collaborator could not fulfil a request.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct CollaboratorError(Box<dyn std::error::Error + Send + Sync>);

impl CollaboratorError {
    /// Wrap any error.
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }
}

/// Parameters of a street map with a circle marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerMapRequest {
    /// Marker longitude, degrees.
    pub lon: f64,
    /// Marker latitude, degrees.
    pub lat: f64,
    /// Marker fill as RGB.
    pub color: [u8; 3],
    /// Marker radius in pixels.
    pub radius: f32,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Tile zoom level.
    pub zoom: u8,
}

/// Parameters of a satellite basemap around a point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SatelliteMapRequest {
    /// Center longitude, degrees.
    pub lon: f64,
    /// Center latitude, degrees.
    pub lat: f64,
    /// Half-height of the covered area in meters.
    pub buffer_m: f64,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Tile zoom level.
    pub zoom: u8,
}

/// Renders a street map with a marker into PNG bytes.
pub trait MarkerMap {
    /// Render the map described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the map cannot be produced.
    fn render(&self, request: &MarkerMapRequest) -> Result<Vec<u8>, CollaboratorError>;
}

/// Renders a satellite basemap into PNG bytes.
pub trait SatelliteMap {
    /// Render the map described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the map cannot be produced.
    fn render(&self, request: &SatelliteMapRequest) -> Result<Vec<u8>, CollaboratorError>;
}

/// Read-only store of static report assets.
pub trait AssetStore {
    /// Load the asset called `name`, `Ok(None)` if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`CollaboratorError`] if the asset exists but cannot be read.
    fn load(&self, name: &str) -> Result<Option<Vec<u8>>, CollaboratorError>;
}

/// Map sizes and image widths used during assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblySettings {
    /// Marker fill as RGB.
    pub marker_color: [u8; 3],
    /// Marker radius in pixels.
    pub marker_radius: f32,
    /// Street map width in pixels.
    pub marker_map_width: u32,
    /// Street map height in pixels.
    pub marker_map_height: u32,
    /// Street map tile zoom.
    pub marker_map_zoom: u8,
    /// Satellite half-height in meters.
    pub satellite_buffer_m: f64,
    /// Satellite tile zoom.
    pub satellite_zoom: u8,
    /// Satellite map width in pixels.
    pub satellite_width: u32,
    /// Satellite map height in pixels.
    pub satellite_height: u32,
    /// Printed width of the location map.
    pub map_width_cm: f64,
    /// Printed width of the voltage reference table.
    pub reference_width_cm: f64,
    /// Printed width of each segment photo.
    pub photo_width_cm: f64,
}

impl AssemblySettings {
    /// Default marker color, pure red.
    pub const DEFAULT_MARKER_COLOR: [u8; 3] = [255, 0, 0];
    /// Default marker radius in pixels.
    pub const DEFAULT_MARKER_RADIUS: f32 = 12.0;
    /// Default tile zoom for both map kinds.
    pub const DEFAULT_ZOOM: u8 = 17;
    /// Default satellite buffer in meters.
    pub const DEFAULT_SATELLITE_BUFFER_M: f64 = 300.0;
    /// Default printed width of map and reference images.
    pub const DEFAULT_FULL_WIDTH_CM: f64 = 18.0;
    /// Default printed width of segment photos.
    pub const DEFAULT_PHOTO_WIDTH_CM: f64 = 14.0;
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            marker_color: Self::DEFAULT_MARKER_COLOR,
            marker_radius: Self::DEFAULT_MARKER_RADIUS,
            marker_map_width: 600,
            marker_map_height: 400,
            marker_map_zoom: Self::DEFAULT_ZOOM,
            satellite_buffer_m: Self::DEFAULT_SATELLITE_BUFFER_M,
            satellite_zoom: Self::DEFAULT_ZOOM,
            satellite_width: 800,
            satellite_height: 600,
            map_width_cm: Self::DEFAULT_FULL_WIDTH_CM,
            reference_width_cm: Self::DEFAULT_FULL_WIDTH_CM,
            photo_width_cm: Self::DEFAULT_PHOTO_WIDTH_CM,
        }
    }
}

/// External services the assembler calls.
#[derive(Clone)]
pub struct Collaborators<'a> {
    /// Street map renderer for urban sites.
    pub marker_map: &'a dyn MarkerMap,
    /// Satellite renderer for rural sites.
    pub satellite_map: &'a dyn SatelliteMap,
    /// Static images such as the voltage reference tables.
    pub assets: &'a dyn AssetStore,
    /// Date source for the report date fields.
    pub clock: &'a dyn Clock,
    /// Sizes and widths.
    pub settings: AssemblySettings,
}

impl fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Builds a [`RenderContext`] from answers, plan and uploads.
#[derive(Debug, Clone)]
pub struct ContextAssembler<'a> {
    collaborators: Collaborators<'a>,
}

impl<'a> ContextAssembler<'a> {
    /// Assembler calling `collaborators`.
    #[must_use]
    pub const fn new(collaborators: Collaborators<'a>) -> Self {
        Self { collaborators }
    }

    /// Build the context.
    ///
    /// Deterministic for identical inputs and collaborator responses. No
    /// failure aborts assembly; see [`RenderContext::notes`].
    #[must_use]
    pub fn assemble(
        &self,
        answers: &Answers,
        plan: &SegmentPlan,
        uploads: &BTreeMap<String, Upload>,
    ) -> RenderContext {
        let mut context = RenderContext::new();
        for (key, value) in answers.iter() {
            context.insert(key.clone(), ContextEntry::Value(uppercase_strings(value)));
        }
        add_unanswered_fields(answers, &mut context);

        self.add_location_map(answers, &mut context);
        self.add_voltage_fields(answers, &mut context);
        self.add_photos(plan, uploads, &mut context);
        self.add_date(&mut context);

        tracing::debug!(
            entries = context.len(),
            notes = context.notes().len(),
            "report context assembled"
        );
        context
    }

    fn add_location_map(&self, answers: &Answers, context: &mut RenderContext) {
        let point = match coords::location(answers) {
            Ok(point) => point,
            Err(err) => {
                context.insert(keys::MAP_IMAGE, ContextEntry::NoImage);
                context.note(err.into());
                return;
            }
        };
        let mode = catalog::coordinate_mode(answers).unwrap_or(CoordinateMode::Rural);
        match self.render_map(mode, point) {
            Ok(bytes) => context.insert(
                keys::MAP_IMAGE,
                ContextEntry::Image(ImageArtifact {
                    bytes,
                    width_cm: self.collaborators.settings.map_width_cm,
                }),
            ),
            Err(err) => {
                context.insert(keys::MAP_IMAGE, ContextEntry::NoImage);
                context.note(AssemblyNote::MapUnavailable {
                    mode,
                    reason: err.to_string(),
                });
            }
        }
    }

    fn render_map(&self, mode: CoordinateMode, point: LonLat) -> Result<Vec<u8>, CollaboratorError> {
        let s = &self.collaborators.settings;
        match mode {
            CoordinateMode::Urban => {
                let request = MarkerMapRequest {
                    lon: point.lon,
                    lat: point.lat,
                    color: s.marker_color,
                    radius: s.marker_radius,
                    width: s.marker_map_width,
                    height: s.marker_map_height,
                    zoom: s.marker_map_zoom,
                };
                tracing::debug!(?request, "rendering marker map");
                self.collaborators.marker_map.render(&request)
            }
            CoordinateMode::Rural => {
                let request = SatelliteMapRequest {
                    lon: point.lon,
                    lat: point.lat,
                    buffer_m: s.satellite_buffer_m,
                    width: s.satellite_width,
                    height: s.satellite_height,
                    zoom: s.satellite_zoom,
                };
                tracing::debug!(?request, "rendering satellite map");
                self.collaborators.satellite_map.render(&request)
            }
        }
    }

    fn add_voltage_fields(&self, answers: &Answers, context: &mut RenderContext) {
        let Some(voltage) = catalog::test_voltage(answers) else {
            tracing::debug!("no test voltage answered; skipping derived voltage fields");
            context.insert(keys::VOLTAGE_REFERENCE_IMAGE, ContextEntry::NoImage);
            return;
        };
        context.insert(
            keys::TEST_VOLTAGE_MAGNITUDE,
            ContextEntry::Value(Value::from(voltage.magnitude())),
        );

        let name = voltage.reference_asset();
        let entry = match self.collaborators.assets.load(name) {
            Ok(Some(bytes)) => ContextEntry::Image(ImageArtifact {
                bytes,
                width_cm: self.collaborators.settings.reference_width_cm,
            }),
            Ok(None) => {
                tracing::debug!(asset = name, "voltage reference image not found");
                ContextEntry::NoImage
            }
            Err(err) => {
                tracing::warn!(asset = name, %err, "voltage reference image unreadable");
                ContextEntry::NoImage
            }
        };
        context.insert(keys::VOLTAGE_REFERENCE_IMAGE, entry);
    }

    fn add_photos(
        &self,
        plan: &SegmentPlan,
        uploads: &BTreeMap<String, Upload>,
        context: &mut RenderContext,
    ) {
        let width_cm = self.collaborators.settings.photo_width_cm;
        for key in plan.photo_keys() {
            let entry = uploads.get(&key).map_or(ContextEntry::NoImage, |upload| {
                ContextEntry::Image(ImageArtifact {
                    bytes: upload.bytes.clone(),
                    width_cm,
                })
            });
            context.insert(key, entry);
        }
    }

    fn add_date(&self, context: &mut RenderContext) {
        let parts = date_parts(self.collaborators.clock.today());
        context.insert(keys::DAY, ContextEntry::Value(Value::from(parts.day)));
        context.insert(keys::MONTH, ContextEntry::Value(Value::from(parts.month)));
        context.insert(keys::YEAR, ContextEntry::Value(Value::from(parts.year)));
    }
}

/// Give every unanswered text, number and choice field of the form an
/// empty entry. Photo slots are filled by the assembler itself.
fn add_unanswered_fields(answers: &Answers, context: &mut RenderContext) {
    for step in Step::ALL {
        for spec in catalog::fields_for_step(step, answers) {
            if spec.kind != FieldKind::PhotoUpload && !context.contains_key(&spec.key) {
                context.insert(spec.key, ContextEntry::Value(Value::String(String::new())));
            }
        }
    }
}
