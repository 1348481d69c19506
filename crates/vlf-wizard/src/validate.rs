//! Step completeness checks.
//!
//! Pure functions over a set of answers: no side effects, safe to call as
//! often as the input surface likes.

use serde_json::Value;

use crate::catalog::{FieldKind, fields_for_step};
use crate::session::Answers;
use crate::types::{StepError, Step};

/// Whether the whole step may be left.
///
/// Equivalent to `validate_step(step, answers).is_ok()`.
#[must_use]
pub fn is_step_complete(step: Step, answers: &Answers) -> bool {
    validate_step(step, answers).is_ok()
}

/// Check every required field of `step` and every numeric bound.
///
/// A value is missing when the key is absent, `null`, or a string that is
/// empty after trimming. Numeric zero is a real reading and counts as
/// present. Choice fields are complete once any option is stored.
///
/// # Errors
///
/// Returns [`StepError::Missing`] listing all missing keys in catalog
/// order. Otherwise returns the first bound violation found:
/// [`StepError::NotInteger`] or [`StepError::OutOfRange`].
pub fn validate_step(step: Step, answers: &Answers) -> Result<(), StepError> {
    let fields = fields_for_step(step, answers);

    let missing: Vec<String> = fields
        .iter()
        .filter(|f| f.required && !is_present(answers.get(&f.key)))
        .map(|f| f.key.clone())
        .collect();
    if !missing.is_empty() {
        return Err(StepError::Missing { keys: missing });
    }

    for field in &fields {
        let FieldKind::Numeric { min, max, integer } = field.kind else {
            continue;
        };
        let Some(value) = answers.get(&field.key).and_then(Value::as_f64) else {
            continue;
        };
        if integer && value.fract() != 0.0 {
            return Err(StepError::NotInteger {
                key: field.key.clone(),
                value,
            });
        }
        let lo = min.unwrap_or(f64::NEG_INFINITY);
        let hi = max.unwrap_or(f64::INFINITY);
        if value < lo || value > hi {
            return Err(StepError::OutOfRange {
                key: field.key.clone(),
                value,
                min: lo,
                max: hi,
            });
        }
    }

    Ok(())
}

/// Whether an answer counts as given.
#[must_use]
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}
