//! Property tests for the canonical vocabularies and the heuristic parsers.

use larder_core::{
    canonicalize_preparation, canonicalize_unit, extract_partial_recipe, map_category,
    parse_duration, parse_nutrition_value, parse_servings, CanonicalPreparation, CanonicalUnit,
    Category,
};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn canonical_unit_is_a_fixed_point(s in ".{0,40}") {
        if let Some(unit) = canonicalize_unit(Some(&s)) {
            prop_assert!(CanonicalUnit::ALL.contains(&unit));
            prop_assert_eq!(canonicalize_unit(Some(unit.as_str())), Some(unit));
        }
    }

    #[test]
    fn canonical_preparation_is_a_fixed_point(s in ".{0,40}") {
        if let Some(prep) = canonicalize_preparation(Some(&s)) {
            prop_assert!(CanonicalPreparation::ALL.contains(&prep));
            prop_assert_eq!(canonicalize_preparation(Some(prep.as_str())), Some(prep));
        }
    }

    #[test]
    fn unit_ignores_case_and_padding(s in "[a-zA-Z .]{0,20}", pad in " {0,3}") {
        let padded = format!("{pad}{}{pad}", s.to_uppercase());
        prop_assert_eq!(canonicalize_unit(Some(&padded)), canonicalize_unit(Some(&s)));
    }

    #[test]
    fn preparation_ignores_case_and_padding(s in "[a-zA-Z .]{0,20}", pad in " {0,3}") {
        let padded = format!("{pad}{}{pad}", s.to_uppercase());
        prop_assert_eq!(
            canonicalize_preparation(Some(&padded)),
            canonicalize_preparation(Some(&s))
        );
    }

    #[test]
    fn serialized_unit_is_its_token(idx in 0..CanonicalUnit::ALL.len()) {
        let unit = CanonicalUnit::ALL[idx];
        prop_assert_eq!(serde_json::to_value(unit).unwrap(), json!(unit.as_str()));
    }

    #[test]
    fn parsers_are_total(s in ".{0,60}") {
        parse_duration(Some(&s));
        parse_nutrition_value(Some(&s));
        let category = map_category(&[s.as_str()]);
        prop_assert!(Category::ALL.contains(&category));
        // A yield without digits always falls back to the default.
        if !s.chars().any(|c| c.is_ascii_digit()) {
            prop_assert_eq!(parse_servings(Some(&s)), 4);
        }
    }

    #[test]
    fn recovered_numbers_are_whole_and_non_negative(
        serves in proptest::num::f64::ANY,
        prep in -1.0e6f64..1.0e6,
    ) {
        let raw = json!({ "title": "Soup", "serves": serves, "prepTime": prep });
        if let Some(partial) = extract_partial_recipe(&raw) {
            if let Some(minutes) = partial.prep_time {
                prop_assert!(prep >= 0.0);
                prop_assert_eq!(f64::from(minutes), prep.ceil());
            }
            if partial.serves.is_some() {
                prop_assert!(serves.is_finite() && serves >= 0.0);
            }
        }
    }
}
