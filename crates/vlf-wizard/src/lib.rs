//! vlf-wizard: VLF cable test report wizard (sans-IO).
//!
//! Collects the answers of a five-step inspection form, decides which
//! report template fits the tested segments, and assembles the context a
//! document renderer fills that template with:
//!
//! general info -> technical data -> checklist -> per-segment
//! measurements -> photos and report generation.
//!
//! This crate has **no I/O dependencies**. Templates, static assets, maps
//! and the clock are reached through the traits in [`template`],
//! [`context`] and [`calendar`]; filesystem implementations live in
//! `vlf-io`, map rendering in `vlf-map`, and `.docx` output in
//! `vlf-export`.

pub mod calendar;
pub mod catalog;
pub mod context;
pub mod coords;
pub mod session;
pub mod template;
pub mod types;
pub mod validate;
pub mod wizard;

pub use calendar::{Clock, FixedClock, SystemClock};
pub use catalog::{FieldKind, FieldSpec, SegmentPlan, SegmentSlot, fields_for_step, find_field};
pub use context::{
    AssemblyNote, AssemblySettings, AssetStore, CollaboratorError, Collaborators, ContextAssembler,
    ContextEntry, ImageArtifact, MarkerMap, MarkerMapRequest, RenderContext, SatelliteMap,
    SatelliteMapRequest,
};
pub use session::{Answers, Session};
pub use template::{MemoryTemplateStore, TemplateHandle, TemplateId, TemplateStore, resolve};
pub use types::{
    AdvanceError, CoordinateMode, Phase, RenderError, SegmentCountError, SegmentType, SessionError,
    Step, StepError, TemplateError, TestVoltage, Upload,
};
pub use validate::{is_step_complete, validate_step};
pub use wizard::{REPORT_FILE_NAME, REPORT_MIME_TYPE, ReportDownload, ReportRenderer, Transition, Wizard};
