#![allow(clippy::unwrap_used)]

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{Value, json};
use vlf_wizard::catalog::keys;
use vlf_wizard::context::uppercase_strings;
use vlf_wizard::coords::parse_decimal;
use vlf_wizard::{
    Answers, MemoryTemplateStore, SegmentType, Step, Wizard, fields_for_step, is_step_complete,
    resolve, validate_step,
};

fn segment_type() -> impl Strategy<Value = SegmentType> {
    prop_oneof![Just(SegmentType::ThreePhase), Just(SegmentType::SinglePhase)]
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-zA-Záéíóúñ ]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn plan_answers(segment_type: SegmentType, count: u32) -> Answers {
    [
        (keys::SEGMENT_TYPE, json!(segment_type.label())),
        (keys::SEGMENT_COUNT, json!(count)),
    ]
    .into_iter()
    .collect()
}

proptest! {
    #[test]
    fn segment_fields_have_one_group_per_slot(
        (kind, count) in segment_type().prop_flat_map(|t| (Just(t), 1..=t.max_segments()))
    ) {
        let answers = plan_answers(kind, count);
        let fields = fields_for_step(Step::Segments, &answers);
        let slots = count as usize * kind.phases().len();
        prop_assert_eq!(fields.len(), slots * 5);

        let keys: HashSet<&str> = fields.iter().map(|f| f.key.as_str()).collect();
        prop_assert_eq!(keys.len(), fields.len());

        let groups: HashSet<_> = fields.iter().filter_map(|f| f.segment).collect();
        prop_assert_eq!(groups.len(), slots);
    }

    #[test]
    fn blanking_any_required_field_makes_step_incomplete(
        blank in prop_oneof![Just(Value::Null), Just(json!("")), Just(json!("  \t"))],
        index in 0usize..8,
    ) {
        let mut answers: Answers = fields_for_step(Step::GeneralInfo, &Answers::new())
            .into_iter()
            .map(|f| (f.key, json!("x")))
            .collect();
        prop_assert!(is_step_complete(Step::GeneralInfo, &answers));

        let key = fields_for_step(Step::GeneralInfo, &answers)[index].key.clone();
        answers.insert(key, blank);
        prop_assert!(!is_step_complete(Step::GeneralInfo, &answers));
    }

    #[test]
    fn validation_is_pure(count in 0u32..30, t in segment_type()) {
        let answers = plan_answers(t, count);
        for step in Step::ALL {
            prop_assert_eq!(validate_step(step, &answers), validate_step(step, &answers));
        }
    }

    #[test]
    fn resolve_is_pure(t in segment_type(), count in 1u32..=20) {
        prop_assert_eq!(resolve(t, count), resolve(t, count));
        let id = resolve(t, count);
        let expected_suffix = format!("FS{count}TR");
        prop_assert!(id.as_str().ends_with(&expected_suffix));
    }

    #[test]
    fn uppercase_is_idempotent(value in json_value()) {
        let once = uppercase_strings(&value);
        prop_assert_eq!(uppercase_strings(&once), once);
    }

    #[test]
    fn uppercase_preserves_shape(value in json_value()) {
        fn same_shape(a: &Value, b: &Value) -> bool {
            match (a, b) {
                (Value::Object(x), Value::Object(y)) => {
                    x.len() == y.len()
                        && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| same_shape(v, w)))
                }
                (Value::Array(x), Value::Array(y)) => {
                    x.len() == y.len() && x.iter().zip(y).all(|(v, w)| same_shape(v, w))
                }
                (Value::String(_), Value::String(_)) => true,
                (x, y) => x == y,
            }
        }
        prop_assert!(same_shape(&value, &uppercase_strings(&value)));
    }

    #[test]
    fn comma_and_dot_decimals_agree(whole in -180i32..180, frac in 0u32..100_000) {
        let dot = format!("{whole}.{frac:05}");
        let comma = format!("{whole},{frac:05}");
        prop_assert_eq!(parse_decimal(&dot), parse_decimal(&comma));
        prop_assert!(parse_decimal(&dot).is_some());
    }

    #[test]
    fn advance_and_retreat_stay_in_bounds(moves in prop::collection::vec(any::<bool>(), 0..40)) {
        let mut wizard = Wizard::new(MemoryTemplateStore::new());
        for forward in moves {
            let before = wizard.step();
            if forward {
                // nothing is answered, so every advance is rejected
                prop_assert!(wizard.advance().is_err());
                prop_assert_eq!(wizard.step(), before);
            } else {
                let transition = wizard.retreat();
                prop_assert!(transition.to >= Step::FIRST);
                prop_assert_eq!(wizard.step(), Step::GeneralInfo);
            }
        }
    }
}
