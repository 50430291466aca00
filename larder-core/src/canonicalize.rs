//! Field canonicalizers.
//!
//! Turn the open-vocabulary ingredient and method fields a model produces into
//! the closed, storage-safe shapes in [`crate::types`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::parsers::{
    map_category, parse_duration, parse_nutrition_value, parse_servings, DEFAULT_SERVINGS,
};
use crate::schema::{PageCandidate, RawNutrition, TextCandidate};
use crate::types::{MethodStep, NormalizedRecipe, NutritionInfo, StructuredIngredient};
use crate::vocabulary::{normalize_token, CanonicalPreparation, CanonicalUnit};

/// Ingredient as emitted by the model: free-text unit and preparation,
/// explicit nulls for anything unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawIngredient {
    /// Ingredient name without quantity or preparation, e.g. "red onion".
    pub name: String,
    /// Numeric quantity, e.g. 1.5.
    pub amount: Option<f64>,
    /// Measurement unit as written, e.g. "tablespoons".
    pub unit: Option<String>,
    /// Preparation as written, e.g. "finely chopped".
    pub preparation: Option<String>,
}

/// Method step as emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RawMethodStep {
    /// Short imperative summary of the step.
    pub title: String,
    /// Full instructions for the step.
    pub description: Option<String>,
}

/// Map a free-text unit onto the unit vocabulary.
///
/// Exact canonical tokens pass through, then the synonym table is consulted.
/// Unknown units yield `None`; no default unit is ever invented.
pub fn canonicalize_unit(raw: Option<&str>) -> Option<CanonicalUnit> {
    let token = normalize_token(raw?);
    if token.is_empty() {
        return None;
    }
    CanonicalUnit::from_token(&token).or_else(|| CanonicalUnit::from_synonym(&token))
}

/// Map a free-text preparation onto the preparation vocabulary, same
/// strategy as [`canonicalize_unit`].
pub fn canonicalize_preparation(raw: Option<&str>) -> Option<CanonicalPreparation> {
    let token = normalize_token(raw?);
    if token.is_empty() {
        return None;
    }
    CanonicalPreparation::from_token(&token)
        .or_else(|| CanonicalPreparation::from_synonym(&token))
}

pub fn clean_ingredients(raw: Vec<RawIngredient>) -> Vec<StructuredIngredient> {
    raw.into_iter().map(clean_ingredient).collect()
}

fn clean_ingredient(raw: RawIngredient) -> StructuredIngredient {
    let unit = canonicalize_unit(raw.unit.as_deref());
    if unit.is_none() && raw.unit.is_some() {
        tracing::debug!(unit = raw.unit.as_deref(), name = %raw.name, "dropping unknown unit");
    }

    StructuredIngredient {
        name: raw.name,
        amount: raw.amount,
        unit,
        preparation: canonicalize_preparation(raw.preparation.as_deref()),
    }
}

pub fn clean_method_steps(raw: Vec<RawMethodStep>) -> Vec<MethodStep> {
    raw.into_iter()
        .map(|step| MethodStep {
            title: step.title,
            description: step.description,
        })
        .collect()
}

/// Turn an accepted text candidate into a recipe. Its nutrition is already
/// typed and complete.
pub fn normalize_text_candidate(candidate: TextCandidate) -> NormalizedRecipe {
    NormalizedRecipe {
        title: candidate.title.trim().to_string(),
        description: candidate.description,
        prep_time: candidate.prep_time.unwrap_or(0),
        cook_time: candidate.cook_time.unwrap_or(0),
        serves: candidate.serves.unwrap_or(DEFAULT_SERVINGS),
        category: candidate.category,
        ingredients: clean_ingredients(candidate.ingredients),
        method: clean_method_steps(candidate.method),
        nutrition: Some(candidate.nutrition),
        image_url: None,
        author: None,
        source_url: None,
    }
}

/// Turn an accepted page/photo candidate into a recipe, running the
/// heuristic parsers over its as-printed values.
pub fn normalize_page_candidate(candidate: PageCandidate) -> NormalizedRecipe {
    NormalizedRecipe {
        title: candidate.title.trim().to_string(),
        description: candidate.description,
        prep_time: parse_duration(candidate.prep_time.as_deref()),
        cook_time: parse_duration(candidate.cook_time.as_deref()),
        serves: parse_servings(candidate.recipe_yield.as_deref()),
        category: map_category(&candidate.recipe_category),
        ingredients: clean_ingredients(candidate.ingredients),
        method: clean_method_steps(candidate.method),
        nutrition: candidate.nutrition.as_ref().and_then(parse_raw_nutrition),
        image_url: candidate.image_url,
        author: candidate.author,
        source_url: None,
    }
}

/// All four amounts must parse; otherwise nothing is kept.
fn parse_raw_nutrition(raw: &RawNutrition) -> Option<NutritionInfo> {
    Some(NutritionInfo {
        calories: parse_nutrition_value(raw.calories.as_deref())?,
        protein: parse_nutrition_value(raw.protein.as_deref())?,
        fat: parse_nutrition_value(raw.fat.as_deref())?,
        carbohydrates: parse_nutrition_value(raw.carbohydrates.as_deref())?,
    })
}
