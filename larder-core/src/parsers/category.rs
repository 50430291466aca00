use serde_json::Value as JsonValue;

use crate::types::Category;

/// Keywords checked in priority order; the first one found anywhere wins.
const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
    ("breakfast", Category::Breakfast),
    ("lunch", Category::Lunch),
    ("dinner", Category::Dinner),
    ("dessert", Category::Dessert),
    ("appetizer", Category::Appetizer),
    ("snack", Category::Snack),
    ("side", Category::Side),
    ("beverage", Category::Beverage),
    ("drink", Category::Beverage),
];

/// Map free-text category labels (e.g. schema.org `recipeCategory`) onto the
/// fixed taxonomy.
///
/// Matching is a case-insensitive substring test. When labels hit several
/// keywords, the keyword earliest in the priority list wins regardless of
/// label order. No match means [`Category::Main`].
pub fn map_category<S: AsRef<str>>(labels: &[S]) -> Category {
    let haystack: Vec<String> = labels
        .iter()
        .map(|label| label.as_ref().to_lowercase())
        .collect();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| haystack.iter().any(|label| label.contains(keyword)))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Main)
}

/// Same as [`map_category`] for an untyped JSON value: a string, an array of
/// strings (non-strings are ignored), or anything else (treated as no labels).
pub fn map_category_value(value: &JsonValue) -> Category {
    match value {
        JsonValue::String(label) => map_category(&[label.as_str()]),
        JsonValue::Array(items) => {
            let labels: Vec<&str> = items.iter().filter_map(JsonValue::as_str).collect();
            map_category(&labels)
        }
        _ => Category::Main,
    }
}
