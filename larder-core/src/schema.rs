//! Strict extraction schema.
//!
//! The candidate types below are what the generative model is asked to
//! produce. Their JSON Schema is derived with `schemars` and then tightened for
//! strict structured-output back-ends: every property is listed in `required`
//! (optional ones are nullable instead of omittable) and no additional
//! properties are allowed. The same schema doubles as the acceptance gate for
//! a "complete" extraction.

use schemars::gen::SchemaSettings;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::canonicalize::{RawIngredient, RawMethodStep};
use crate::types::{Category, NutritionInfo};

/// Used when the model declines without saying why.
const DEFAULT_DECLINE_MESSAGE: &str = "The text does not appear to contain a recipe";

/// Schema keywords that strict structured-output back-ends reject.
const STRIPPED_KEYWORDS: &[&str] = &[
    "$schema",
    "definitions",
    "format",
    "minimum",
    "maximum",
    "default",
];

/// A candidate type the model can be asked to fill in.
pub trait StrictSchema: DeserializeOwned + JsonSchema {
    /// Schema name sent to the model API.
    const NAME: &'static str;

    /// The model's own report that the input was unusable, if it made one.
    fn declined(_raw: &JsonValue) -> Option<String> {
        None
    }

    /// Checks the type system can't express. Returns a reason on failure.
    fn check(&self) -> Result<(), String>;
}

/// Candidate for plain-text sources. The model self-reports unusable input
/// through `success`/`error`, and must always provide nutrition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextCandidate {
    /// False when the text does not contain a usable recipe.
    pub success: bool,
    /// Why extraction failed; null when successful.
    pub error: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// Preparation time in whole minutes.
    pub prep_time: Option<u32>,
    /// Cooking time in whole minutes.
    pub cook_time: Option<u32>,
    /// Number of servings.
    pub serves: Option<u32>,
    pub category: Category,
    pub ingredients: Vec<RawIngredient>,
    pub method: Vec<RawMethodStep>,
    /// Estimated nutrition per serving.
    pub nutrition: NutritionInfo,
}

/// Nutrition amounts as printed, e.g. "12g" or "300 kcal".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RawNutrition {
    pub calories: Option<String>,
    pub protein: Option<String>,
    pub fat: Option<String>,
    pub carbohydrates: Option<String>,
}

/// Candidate for web pages and photos. Values are kept as printed
/// (schema.org style) and parsed heuristically afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageCandidate {
    pub title: String,
    pub description: Option<String>,
    /// ISO-8601 duration, e.g. "PT15M".
    pub prep_time: Option<String>,
    /// ISO-8601 duration, e.g. "PT1H".
    pub cook_time: Option<String>,
    /// Yield as written, e.g. "Serves 4-6".
    pub recipe_yield: Option<String>,
    /// Category labels as written, e.g. ["Dessert", "Baking"].
    pub recipe_category: Vec<String>,
    pub ingredients: Vec<RawIngredient>,
    pub method: Vec<RawMethodStep>,
    pub nutrition: Option<RawNutrition>,
    /// Absolute URL of the main recipe photo.
    pub image_url: Option<String>,
    pub author: Option<String>,
}

impl StrictSchema for TextCandidate {
    const NAME: &'static str = "text_recipe";

    fn declined(raw: &JsonValue) -> Option<String> {
        if raw.get("success").and_then(JsonValue::as_bool) != Some(false) {
            return None;
        }
        let message = raw
            .get("error")
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_DECLINE_MESSAGE);
        Some(message.to_string())
    }

    fn check(&self) -> Result<(), String> {
        check_recipe_body(&self.title, &self.ingredients, &self.method)
    }
}

impl StrictSchema for PageCandidate {
    const NAME: &'static str = "page_recipe";

    fn check(&self) -> Result<(), String> {
        check_recipe_body(&self.title, &self.ingredients, &self.method)
    }
}

fn check_recipe_body(
    title: &str,
    ingredients: &[RawIngredient],
    method: &[RawMethodStep],
) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("title is empty".to_string());
    }
    if ingredients.is_empty() {
        return Err("no ingredients".to_string());
    }
    if method.is_empty() {
        return Err("no method steps".to_string());
    }
    if let Some(idx) = ingredients.iter().position(|i| i.name.trim().is_empty()) {
        return Err(format!("ingredients[{idx}].name is empty"));
    }
    if let Some(idx) = method.iter().position(|s| s.title.trim().is_empty()) {
        return Err(format!("method[{idx}].title is empty"));
    }
    Ok(())
}

/// The strict JSON Schema for a candidate type.
pub fn strict_schema<T: JsonSchema>() -> JsonValue {
    let generator = SchemaSettings::draft07()
        .with(|settings| {
            settings.inline_subschemas = true;
            settings.meta_schema = None;
        })
        .into_generator();
    let root = generator.into_root_schema_for::<T>();

    let mut schema = serde_json::to_value(root).unwrap_or(JsonValue::Null);
    make_strict(&mut schema);
    schema
}

fn make_strict(schema: &mut JsonValue) {
    let JsonValue::Object(map) = schema else {
        return;
    };

    for keyword in STRIPPED_KEYWORDS {
        map.remove(*keyword);
    }
    // The root carries the type name as "title"; a property called "title"
    // lives under "properties" and is unaffected.
    if map.get("title").is_some_and(JsonValue::is_string) {
        map.remove("title");
    }

    let required = match map.get_mut("properties") {
        Some(JsonValue::Object(properties)) => {
            for property in properties.values_mut() {
                make_strict(property);
            }
            Some(
                properties
                    .keys()
                    .cloned()
                    .map(JsonValue::String)
                    .collect::<Vec<_>>(),
            )
        }
        _ => None,
    };
    if let Some(required) = required {
        map.insert("required".to_string(), JsonValue::Array(required));
        map.insert("additionalProperties".to_string(), JsonValue::Bool(false));
    }

    if let Some(items) = map.get_mut("items") {
        make_strict(items);
    }
    for combinator in ["anyOf", "oneOf", "allOf"] {
        if let Some(JsonValue::Array(variants)) = map.get_mut(combinator) {
            for variant in variants {
                make_strict(variant);
            }
        }
    }
}

/// Parse raw model text into JSON, tolerating a surrounding markdown fence or
/// chatter around a single top-level object.
pub fn parse_model_output(content: &str) -> Option<JsonValue> {
    let trimmed = content.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = strip_code_fence(trimmed);
    if let Ok(value) = serde_json::from_str(unfenced) {
        return Some(value);
    }

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&unfenced[start..=end]).ok()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string ("json") on the opening line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Run the acceptance gate over parsed model output.
///
/// Every property the strict schema declares must be present (null is fine
/// where allowed), the value must deserialize into `T`, and `T::check` must
/// pass. Returns the reason on failure.
pub fn validate_candidate<T: StrictSchema>(raw: &JsonValue) -> Result<T, String> {
    if !raw.is_object() {
        return Err("output is not a JSON object".to_string());
    }

    let schema = strict_schema::<T>();
    let mut missing = Vec::new();
    collect_missing(&schema, raw, "", &mut missing);
    if !missing.is_empty() {
        return Err(format!("missing fields: {}", missing.join(", ")));
    }

    let candidate: T = serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;
    candidate.check()?;
    Ok(candidate)
}

fn collect_missing(schema: &JsonValue, value: &JsonValue, path: &str, missing: &mut Vec<String>) {
    if let Some(variants) = schema.get("anyOf").and_then(JsonValue::as_array) {
        if value.is_null() {
            return;
        }
        for variant in variants {
            if variant.get("type").and_then(JsonValue::as_str) != Some("null") {
                collect_missing(variant, value, path, missing);
            }
        }
        return;
    }

    if let (Some(properties), Some(object)) = (
        schema.get("properties").and_then(JsonValue::as_object),
        value.as_object(),
    ) {
        for (name, property_schema) in properties {
            let child = if path.is_empty() {
                name.clone()
            } else {
                format!("{path}.{name}")
            };
            match object.get(name) {
                Some(child_value) => {
                    collect_missing(property_schema, child_value, &child, missing)
                }
                None => missing.push(child),
            }
        }
    }

    if let (Some(items), Some(array)) = (schema.get("items"), value.as_array()) {
        for (idx, item) in array.iter().enumerate() {
            collect_missing(items, item, &format!("{path}[{idx}]"), missing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_output() -> JsonValue {
        json!({
            "success": true,
            "error": null,
            "title": "Tomato Soup",
            "description": null,
            "prepTime": 10,
            "cookTime": 25,
            "serves": null,
            "category": "lunch",
            "ingredients": [
                {"name": "tomatoes", "amount": 6, "unit": "pieces", "preparation": "chop"},
                {"name": "salt", "amount": null, "unit": null, "preparation": null}
            ],
            "method": [
                {"title": "Simmer", "description": "Simmer for 25 minutes."}
            ],
            "nutrition": {"calories": 120, "protein": 3, "fat": 4, "carbohydrates": 18}
        })
    }

    #[test]
    fn strict_schema_requires_every_property() {
        let schema = strict_schema::<TextCandidate>();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(JsonValue::as_str)
            .collect();
        for field in ["success", "error", "description", "prepTime", "nutrition"] {
            assert!(required.contains(&field), "{field} not required");
        }
        assert_eq!(schema["additionalProperties"], json!(false));

        let ingredient = &schema["properties"]["ingredients"]["items"];
        assert_eq!(ingredient["additionalProperties"], json!(false));
        assert_eq!(ingredient["required"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn strict_schema_strips_unsupported_keywords() {
        let text = serde_json::to_string(&strict_schema::<TextCandidate>()).unwrap();
        assert!(!text.contains("\"format\""));
        assert!(!text.contains("\"$schema\""));
        assert!(!text.contains("\"minimum\""));
    }

    #[test]
    fn page_schema_keeps_title_property() {
        let schema = strict_schema::<PageCandidate>();
        assert!(schema["properties"].get("title").is_some());
        assert!(schema["properties"].get("imageUrl").is_some());
        assert!(schema["properties"].get("success").is_none());
    }

    #[test]
    fn accepts_complete_output() {
        let candidate: TextCandidate = validate_candidate(&text_output()).unwrap();
        assert_eq!(candidate.title, "Tomato Soup");
        assert_eq!(candidate.serves, None);
        assert_eq!(candidate.category, Category::Lunch);
        assert_eq!(candidate.ingredients[0].unit.as_deref(), Some("pieces"));
        assert_eq!(candidate.nutrition.calories, 120);
    }

    #[test]
    fn omitted_nullable_field_is_rejected() {
        let mut output = text_output();
        output.as_object_mut().unwrap().remove("description");
        output["ingredients"][1]
            .as_object_mut()
            .unwrap()
            .remove("unit");

        let err = validate_candidate::<TextCandidate>(&output).unwrap_err();
        assert!(err.contains("description"), "{err}");
        assert!(err.contains("ingredients[1].unit"), "{err}");
    }

    #[test]
    fn wrong_types_are_rejected() {
        let mut output = text_output();
        output["category"] = json!("brunch");
        assert!(validate_candidate::<TextCandidate>(&output).is_err());
    }

    #[test]
    fn empty_names_are_rejected() {
        let mut output = text_output();
        output["ingredients"][0]["name"] = json!("  ");
        let err = validate_candidate::<TextCandidate>(&output).unwrap_err();
        assert_eq!(err, "ingredients[0].name is empty");
    }

    #[test]
    fn decline_is_reported() {
        let raw = json!({"success": false, "error": "Just a shopping list"});
        assert_eq!(
            TextCandidate::declined(&raw),
            Some("Just a shopping list".to_string())
        );
        assert_eq!(
            TextCandidate::declined(&json!({"success": false, "error": null})),
            Some(DEFAULT_DECLINE_MESSAGE.to_string())
        );
        assert_eq!(TextCandidate::declined(&text_output()), None);
    }

    #[test]
    fn page_candidate_accepts_nullable_strings() {
        let raw = json!({
            "title": "Brownies",
            "description": null,
            "prepTime": "PT15M",
            "cookTime": null,
            "recipeYield": "Makes 16 squares",
            "recipeCategory": [],
            "ingredients": [{"name": "butter", "amount": 200, "unit": "grams", "preparation": null}],
            "method": [{"title": "Bake", "description": null}],
            "nutrition": null,
            "imageUrl": null,
            "author": null
        });
        let candidate = validate_candidate::<PageCandidate>(&raw).unwrap();
        assert_eq!(candidate.prep_time.as_deref(), Some("PT15M"));
        assert!(candidate.nutrition.is_none());

        let mut missing_nested = raw.clone();
        missing_nested["nutrition"] = json!({"calories": "200 kcal"});
        let err = validate_candidate::<PageCandidate>(&missing_nested).unwrap_err();
        assert!(err.contains("nutrition.protein"), "{err}");
    }

    #[test]
    fn parses_fenced_and_chatty_output() {
        assert_eq!(
            parse_model_output("```json\n{\"a\": 1}\n```"),
            Some(json!({"a": 1}))
        );
        assert_eq!(
            parse_model_output("Here you go: {\"a\": 1} hope that helps"),
            Some(json!({"a": 1}))
        );
        assert_eq!(parse_model_output("no json here"), None);
    }
}
