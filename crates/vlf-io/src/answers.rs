//! Batch answers files.

use std::path::Path;

use vlf_wizard::Answers;

use crate::types::IoError;

/// Load answers from a JSON object file keyed by field key.
///
/// # Errors
///
/// Returns [`IoError::Read`] if the file cannot be read and
/// [`IoError::Json`] if it is not a JSON object.
pub fn load_answers(path: &Path) -> Result<Answers, IoError> {
    let text = std::fs::read_to_string(path).map_err(|source| IoError::read(path, source))?;
    let answers: Answers = serde_json::from_str(&text).map_err(|source| IoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), answers = answers.len(), "loaded answers");
    Ok(answers)
}
