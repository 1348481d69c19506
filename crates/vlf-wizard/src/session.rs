//! Session state: the current step plus every collected answer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{self, FieldKind};
use crate::types::{SessionError, Step, Upload};

/// Answers keyed by field key.
///
/// Values are JSON values so free text, numbers and nested structures share
/// one representation. Building an `Answers` directly performs no
/// validation; [`Session::set`] is the validated entry point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers(BTreeMap<String, Value>);

impl Answers {
    /// An empty answer set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// The value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value under `key` when it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Whether `key` has a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of stored answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing has been answered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Consume the answers and return the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<BTreeMap<String, Value>> for Answers {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Answers {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One wizard run: current step, answers and uploaded photos.
///
/// Owned by exactly one wizard. Nothing here is persisted; dropping the
/// session discards it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    step: Step,
    answers: Answers,
    uploads: BTreeMap<String, Upload>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session on step 1 with no answers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            step: Step::FIRST,
            answers: Answers::new(),
            uploads: BTreeMap::new(),
        }
    }

    /// The step currently shown.
    #[must_use]
    pub const fn step(&self) -> Step {
        self.step
    }

    pub(crate) const fn set_step(&mut self, step: Step) {
        self.step = step;
    }

    /// The value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.answers.get(key)
    }

    /// Read-only view of the live answers.
    #[must_use]
    pub const fn answers(&self) -> &Answers {
        &self.answers
    }

    /// Immutable copy of the answers for downstream read-only use.
    #[must_use]
    pub fn snapshot(&self) -> Answers {
        self.answers.clone()
    }

    /// Photos attached so far, keyed by slot key.
    #[must_use]
    pub const fn uploads(&self) -> &BTreeMap<String, Upload> {
        &self.uploads
    }

    /// Store an answer.
    ///
    /// Keys are never removed; setting an existing key overwrites it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownField`] if the catalog has no such
    /// key for the current answers, or [`SessionError::WrongKind`] if the
    /// value does not fit the field (photo slots never accept values).
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), SessionError> {
        let spec = catalog::find_field(key, &self.answers)
            .ok_or_else(|| SessionError::UnknownField(key.to_string()))?;
        if !spec.kind.accepts(&value) {
            return Err(SessionError::WrongKind {
                key: key.to_string(),
                expected: spec.kind.describe(),
            });
        }
        tracing::trace!(key, step = spec.step.number(), "answer set");
        self.answers.insert(key, value);
        Ok(())
    }

    /// Attach a photo to a step-5 slot.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownField`] if `key` is not a photo slot
    /// of the current segment plan, or [`SessionError::WrongKind`] if the
    /// key names a non-photo field.
    pub fn attach_upload(&mut self, key: &str, upload: Upload) -> Result<(), SessionError> {
        let spec = catalog::find_field(key, &self.answers)
            .ok_or_else(|| SessionError::UnknownField(key.to_string()))?;
        if spec.kind != FieldKind::PhotoUpload {
            return Err(SessionError::WrongKind {
                key: key.to_string(),
                expected: spec.kind.describe(),
            });
        }
        tracing::debug!(key, file = %upload.file_name, bytes = upload.bytes.len(), "photo attached");
        self.uploads.insert(key.to_string(), upload);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::catalog::keys;

    #[test]
    fn new_session_starts_empty_on_step_one() {
        let session = Session::new();
        assert_eq!(session.step(), Step::GeneralInfo);
        assert!(session.answers().is_empty());
        assert!(session.uploads().is_empty());
    }

    #[test]
    fn set_and_get() {
        let mut session = Session::new();
        session.set(keys::PROJECT_NAME, json!("Subestación Norte")).unwrap();
        assert_eq!(session.get(keys::PROJECT_NAME), Some(&json!("Subestación Norte")));
    }

    #[test]
    fn set_overwrites() {
        let mut session = Session::new();
        session.set(keys::ADDRESS, json!("Calle 1")).unwrap();
        session.set(keys::ADDRESS, json!("Calle 2")).unwrap();
        assert_eq!(session.get(keys::ADDRESS), Some(&json!("Calle 2")));
    }

    #[test]
    fn unknown_key_rejected() {
        let mut session = Session::new();
        let err = session.set("noExiste", json!("x")).unwrap_err();
        assert_eq!(err, SessionError::UnknownField("noExiste".into()));
        assert!(session.answers().is_empty());
    }

    #[test]
    fn segment_keys_become_legal_after_plan_is_known() {
        let mut session = Session::new();
        assert!(session.set("nombreCircuitoTrm1", json!("C1")).is_err());
        session.set(keys::SEGMENT_TYPE, json!("Monofásicos")).unwrap();
        session.set(keys::SEGMENT_COUNT, json!(1)).unwrap();
        session.set("nombreCircuitoTrm1", json!("C1")).unwrap();
    }

    #[test]
    fn wrong_kinds_rejected() {
        let mut session = Session::new();
        assert!(matches!(
            session.set(keys::TEST_VOLTAGE, json!("Alta")),
            Err(SessionError::WrongKind { .. })
        ));
        assert!(matches!(
            session.set(keys::SEGMENT_COUNT, json!("tres")),
            Err(SessionError::WrongKind { .. })
        ));
        assert!(matches!(
            session.set(keys::PROJECT_NAME, json!(3)),
            Err(SessionError::WrongKind { .. })
        ));
    }

    #[test]
    fn snapshot_is_detached_from_live_state() {
        let mut session = Session::new();
        session.set(keys::CITY, json!("Bogotá")).unwrap();
        let snapshot = session.snapshot();
        session.set(keys::CITY, json!("Medellín")).unwrap();
        assert_eq!(snapshot.get_str(keys::CITY), Some("Bogotá"));
    }

    #[test]
    fn uploads_only_go_to_photo_slots() {
        let mut session = Session::new();
        session.set(keys::SEGMENT_TYPE, json!("Trifásicos")).unwrap();
        session.set(keys::SEGMENT_COUNT, json!(1)).unwrap();
        let upload = Upload {
            file_name: "a.png".into(),
            bytes: vec![1, 2, 3],
        };
        session.attach_upload("imgPruebaTramoTrm1B", upload.clone()).unwrap();
        assert!(session.attach_upload("imgPruebaTramoTrm2A", upload.clone()).is_err());
        assert!(matches!(
            session.attach_upload(keys::CITY, upload),
            Err(SessionError::WrongKind { .. })
        ));
        assert_eq!(session.uploads().len(), 1);
    }

    #[test]
    fn photo_slot_rejects_plain_values() {
        let mut session = Session::new();
        session.set(keys::SEGMENT_TYPE, json!("Monofásicos")).unwrap();
        session.set(keys::SEGMENT_COUNT, json!(1)).unwrap();
        assert!(session.set("imgPruebaTramoTrm1", json!("foto.png")).is_err());
    }

    #[test]
    fn answers_serialize_as_plain_object() {
        let answers: Answers = [("a", json!(1)), ("b", json!("x"))].into_iter().collect();
        let text = serde_json::to_string(&answers).unwrap();
        assert_eq!(text, r#"{"a":1,"b":"x"}"#);
    }
}
