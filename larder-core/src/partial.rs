//! Best-effort recovery from model output that failed validation.
//!
//! Every field is read independently and kept only if it is well-typed, so a
//! single bad field never costs the rest of the record. Both candidate shapes
//! are understood: numbers and taxonomy tokens from text extraction, and the
//! printed values (ISO durations, `recipeYield`, `recipeCategory`, nutrition
//! strings) from page and photo extraction.

use serde_json::{Map, Value as JsonValue};

use crate::canonicalize::{canonicalize_preparation, canonicalize_unit};
use crate::parsers::{
    iso_duration_minutes, map_category_value, parse_nutrition_value, servings_in,
};
use crate::types::{Category, MethodStep, NutritionInfo, PartialRecipe, StructuredIngredient};

/// Fewer populated fields than this is not worth showing the user.
pub const MIN_PARTIAL_FIELDS: usize = 2;

/// Salvage whatever typed fields can be found in `raw`.
///
/// Returns `None` when `raw` is not an object or fewer than
/// [`MIN_PARTIAL_FIELDS`] top-level fields survive.
pub fn extract_partial_recipe(raw: &JsonValue) -> Option<PartialRecipe> {
    let object = raw.as_object()?;

    let partial = PartialRecipe {
        title: non_empty_string(object.get("title")),
        description: non_empty_string(object.get("description")),
        prep_time: minutes(object.get("prepTime")),
        cook_time: minutes(object.get("cookTime")),
        serves: whole_number(object.get("serves")).or_else(|| {
            object
                .get("recipeYield")
                .and_then(JsonValue::as_str)
                .and_then(servings_in)
        }),
        category: recover_category(object),
        ingredients: object.get("ingredients").and_then(recover_ingredients),
        method: object.get("method").and_then(recover_method),
        nutrition: object.get("nutrition").and_then(recover_nutrition),
    };

    let populated = partial.field_count();
    tracing::debug!(populated, "partial recipe recovery");
    if populated < MIN_PARTIAL_FIELDS {
        return None;
    }
    Some(partial)
}

fn non_empty_string(value: Option<&JsonValue>) -> Option<String> {
    value
        .and_then(JsonValue::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// A finite, non-negative number rounded up to a whole unit.
fn whole_number(value: Option<&JsonValue>) -> Option<u32> {
    let number = value?.as_f64()?;
    if !number.is_finite() || number < 0.0 {
        return None;
    }
    let rounded = number.ceil();
    if rounded > f64::from(u32::MAX) {
        return None;
    }
    Some(rounded as u32)
}

/// A number of minutes, or an ISO duration string. Other strings are absent
/// rather than zero.
fn minutes(value: Option<&JsonValue>) -> Option<u32> {
    match value? {
        JsonValue::String(token) => iso_duration_minutes(token),
        other => whole_number(Some(other)),
    }
}

/// An exact `category` token, else `recipeCategory` labels mapped onto the
/// taxonomy. Labels must exist for the mapping to apply.
fn recover_category(object: &Map<String, JsonValue>) -> Option<Category> {
    if let Some(category) = object
        .get("category")
        .and_then(JsonValue::as_str)
        .and_then(Category::from_token)
    {
        return Some(category);
    }

    let labels = object.get("recipeCategory")?;
    let has_label = match labels {
        JsonValue::String(label) => !label.trim().is_empty(),
        JsonValue::Array(items) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .any(|label| !label.trim().is_empty()),
        _ => false,
    };
    has_label.then(|| map_category_value(labels))
}

fn recover_ingredients(value: &JsonValue) -> Option<Vec<StructuredIngredient>> {
    let ingredients: Vec<StructuredIngredient> = value
        .as_array()?
        .iter()
        .filter_map(JsonValue::as_object)
        .filter_map(recover_ingredient)
        .collect();
    (!ingredients.is_empty()).then_some(ingredients)
}

fn recover_ingredient(entry: &Map<String, JsonValue>) -> Option<StructuredIngredient> {
    let name = non_empty_string(entry.get("name"))?;
    Some(StructuredIngredient {
        name,
        amount: entry
            .get("amount")
            .and_then(JsonValue::as_f64)
            .filter(|a| a.is_finite()),
        unit: canonicalize_unit(entry.get("unit").and_then(JsonValue::as_str)),
        preparation: canonicalize_preparation(
            entry.get("preparation").and_then(JsonValue::as_str),
        ),
    })
}

fn recover_method(value: &JsonValue) -> Option<Vec<MethodStep>> {
    let steps: Vec<MethodStep> = value
        .as_array()?
        .iter()
        .filter_map(JsonValue::as_object)
        .filter_map(|entry| {
            Some(MethodStep {
                title: non_empty_string(entry.get("title"))?,
                description: entry
                    .get("description")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string),
            })
        })
        .collect();
    (!steps.is_empty()).then_some(steps)
}

/// All four values or nothing. Each may be a number or a printed amount.
fn recover_nutrition(value: &JsonValue) -> Option<NutritionInfo> {
    let object = value.as_object()?;
    let amount = |key: &str| match object.get(key)? {
        JsonValue::String(printed) => parse_nutrition_value(Some(printed.as_str())),
        other => whole_number(Some(other)),
    };
    Some(NutritionInfo {
        calories: amount("calories")?,
        protein: amount("protein")?,
        fat: amount("fat")?,
        carbohydrates: amount("carbohydrates")?,
    })
}
