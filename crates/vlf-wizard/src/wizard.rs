//! The step controller.
//!
//! A [`Wizard`] owns one [`Session`] and moves it through the five steps.
//! Leaving a step requires its answers to validate. Leaving step 2
//! additionally requires a report template for the chosen segment
//! configuration; the template is resolved and loaded before the step
//! changes, so a rejected advance leaves the wizard exactly as it was.

use serde_json::Value;

use crate::catalog::{self, FieldSpec, SegmentPlan};
use crate::context::{Collaborators, ContextAssembler, RenderContext};
use crate::session::{Answers, Session};
use crate::template::{self, TemplateHandle, TemplateStore};
use crate::types::{AdvanceError, RenderError, SessionError, Step, TemplateError, Upload};
use crate::validate::validate_step;

/// File name offered for the generated report.
pub const REPORT_FILE_NAME: &str = "reporteProtocoloVLF.docx";

/// MIME type of the generated report.
pub const REPORT_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// A step change (or a stay, when `from == to`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Step before the call.
    pub from: Step,
    /// Step after the call.
    pub to: Step,
}

impl Transition {
    /// Whether the step actually changed.
    #[must_use]
    pub fn moved(self) -> bool {
        self.from != self.to
    }
}

/// Fills a template with a context to produce a document.
pub trait ReportRenderer {
    /// Renderer-specific failure.
    type Error: std::error::Error;

    /// Render `template` with `context`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the template cannot be filled.
    fn render(&self, template: &TemplateHandle, context: &RenderContext) -> Result<Vec<u8>, Self::Error>;
}

/// A finished report ready to be saved or offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDownload {
    /// Suggested file name.
    pub file_name: String,
    /// MIME type of `bytes`.
    pub mime_type: String,
    /// Document bytes.
    pub bytes: Vec<u8>,
}

impl ReportDownload {
    fn docx(bytes: Vec<u8>) -> Self {
        Self {
            file_name: REPORT_FILE_NAME.to_string(),
            mime_type: REPORT_MIME_TYPE.to_string(),
            bytes,
        }
    }
}

/// Drives one session through the form.
#[derive(Debug)]
pub struct Wizard<T> {
    session: Session,
    templates: T,
    template: Option<TemplateHandle>,
}

impl<T: TemplateStore> Wizard<T> {
    /// A fresh wizard on step 1, loading templates from `templates`.
    #[must_use]
    pub const fn new(templates: T) -> Self {
        Self {
            session: Session::new(),
            templates,
            template: None,
        }
    }

    /// The step currently shown.
    #[must_use]
    pub const fn step(&self) -> Step {
        self.session.step()
    }

    /// Read-only view of the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The template loaded when step 2 was last left, if any.
    #[must_use]
    pub const fn template(&self) -> Option<&TemplateHandle> {
        self.template.as_ref()
    }

    /// Fields of the current step, in prompt order.
    #[must_use]
    pub fn current_fields(&self) -> Vec<FieldSpec> {
        catalog::fields_for_step(self.step(), self.session.answers())
    }

    /// Store an answer for a field of the current step.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotOnStep`] if the field belongs to another
    /// step, or whatever [`Session::set`] rejects.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), SessionError> {
        self.ensure_on_step(key)?;
        self.session.set(key, value)
    }

    /// Attach a photo to a slot of step 5.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotOnStep`] unless the wizard is on step 5,
    /// or whatever [`Session::attach_upload`] rejects.
    pub fn attach_upload(&mut self, key: &str, upload: Upload) -> Result<(), SessionError> {
        self.ensure_on_step(key)?;
        self.session.attach_upload(key, upload)
    }

    fn ensure_on_step(&self, key: &str) -> Result<(), SessionError> {
        let spec = catalog::find_field(key, self.session.answers())
            .ok_or_else(|| SessionError::UnknownField(key.to_string()))?;
        let current = self.step();
        if spec.step != current {
            return Err(SessionError::NotOnStep {
                key: key.to_string(),
                field_step: spec.step,
                current,
            });
        }
        Ok(())
    }

    /// Move to the next step if the current one is complete.
    ///
    /// From step 2 the matching template is loaded first. On step 5 a
    /// successful call validates and stays put.
    ///
    /// # Errors
    ///
    /// - [`AdvanceError::Incomplete`] if the step does not validate.
    /// - [`AdvanceError::TemplateNotFound`] if no template exists for the
    ///   segment configuration (step 2 only).
    /// - [`AdvanceError::TemplateStore`] if loading failed otherwise.
    ///
    /// The step is unchanged on every error.
    pub fn advance(&mut self) -> Result<Transition, AdvanceError> {
        let from = self.step();
        if let Err(source) = validate_step(from, self.session.answers()) {
            tracing::warn!(step = from.number(), %source, "advance rejected");
            return Err(AdvanceError::Incomplete { step: from, source });
        }

        if from == Step::Technical {
            let handle = self.load_template()?;
            tracing::debug!(template = %handle.id(), "template loaded");
            self.template = Some(handle);
        }

        let to = from.next().unwrap_or(from);
        self.session.set_step(to);
        tracing::debug!(from = from.number(), to = to.number(), "advanced");
        Ok(Transition { from, to })
    }

    fn load_template(&self) -> Result<TemplateHandle, AdvanceError> {
        let answers = self.session.answers();
        // validation of step 2 guarantees a plan
        let plan = SegmentPlan::from_answers(answers)
            .ok()
            .flatten()
            .ok_or_else(|| AdvanceError::Incomplete {
                step: Step::Technical,
                source: crate::types::StepError::Missing {
                    keys: vec![catalog::keys::SEGMENT_COUNT.to_string()],
                },
            })?;
        let id = template::resolve(plan.segment_type(), plan.count());
        self.templates.load(&id).map_err(|err| {
            tracing::warn!(template = %id, %err, "template lookup failed");
            match err {
                TemplateError::NotFound(id) => AdvanceError::TemplateNotFound(id),
                other @ TemplateError::Io { .. } => AdvanceError::TemplateStore(other),
            }
        })
    }

    /// Move back one step. Never validates; a no-op on step 1.
    pub fn retreat(&mut self) -> Transition {
        let from = self.step();
        let to = from.previous().unwrap_or(from);
        self.session.set_step(to);
        tracing::debug!(from = from.number(), to = to.number(), "retreated");
        Transition { from, to }
    }

    /// Assemble the render context from a snapshot of the session.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotAtFinalStep`] unless on step 5, or
    /// [`RenderError::SegmentCount`] if the segment configuration is
    /// invalid.
    pub fn build_context(&self, collaborators: &Collaborators<'_>) -> Result<RenderContext, RenderError> {
        let step = self.step();
        if step != Step::LAST {
            return Err(RenderError::NotAtFinalStep(step));
        }
        let answers: Answers = self.session.snapshot();
        let plan = SegmentPlan::from_answers(&answers)?.ok_or(RenderError::TemplateNotLoaded)?;
        let assembler = ContextAssembler::new(collaborators.clone());
        Ok(assembler.assemble(&answers, &plan, self.session.uploads()))
    }

    /// Generate the report document.
    ///
    /// Does not change the session; calling it again yields an
    /// equivalent document.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if not on step 5, no template is loaded,
    /// or the renderer fails.
    pub fn render<R: ReportRenderer>(
        &self,
        collaborators: &Collaborators<'_>,
        renderer: &R,
    ) -> Result<ReportDownload, RenderError> {
        let context = self.build_context(collaborators)?;
        let template = self.template.as_ref().ok_or(RenderError::TemplateNotLoaded)?;
        let bytes = renderer.render(template, &context).map_err(|err| {
            tracing::warn!(template = %template.id(), %err, "report rendering failed");
            RenderError::Renderer(err.to_string())
        })?;
        tracing::info!(
            template = %template.id(),
            bytes = bytes.len(),
            notes = context.notes().len(),
            "report rendered"
        );
        Ok(ReportDownload::docx(bytes))
    }
}
