use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::vocabulary::{CanonicalPreparation, CanonicalUnit};

/// Fixed recipe category taxonomy.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Breakfast,
    Lunch,
    Dinner,
    Dessert,
    Appetizer,
    Snack,
    Side,
    Beverage,
    #[default]
    Main,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::Breakfast,
        Category::Lunch,
        Category::Dinner,
        Category::Dessert,
        Category::Appetizer,
        Category::Snack,
        Category::Side,
        Category::Beverage,
        Category::Main,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Breakfast => "breakfast",
            Category::Lunch => "lunch",
            Category::Dinner => "dinner",
            Category::Dessert => "dessert",
            Category::Appetizer => "appetizer",
            Category::Snack => "snack",
            Category::Side => "side",
            Category::Beverage => "beverage",
            Category::Main => "main",
        }
    }

    /// Exact, case-sensitive membership test against the taxonomy.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == token)
    }
}

/// An ingredient line after canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredIngredient {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<CanonicalUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preparation: Option<CanonicalPreparation>,
}

/// One step of the method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodStep {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Per-serving nutrition. Only ever attached to a record as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NutritionInfo {
    /// Energy in kilocalories.
    pub calories: u32,
    /// Protein in grams.
    pub protein: u32,
    /// Fat in grams.
    pub fat: u32,
    /// Carbohydrates in grams.
    pub carbohydrates: u32,
}

/// A fully validated recipe, the only shape handed to persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecipe {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Minutes.
    pub prep_time: u32,
    /// Minutes.
    pub cook_time: u32,
    pub serves: u32,
    pub category: Category,
    pub ingredients: Vec<StructuredIngredient>,
    pub method: Vec<MethodStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Whatever could be salvaged from output that failed validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRecipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serves: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<StructuredIngredient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<Vec<MethodStep>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionInfo>,
}

impl PartialRecipe {
    /// Number of populated top-level fields.
    pub fn field_count(&self) -> usize {
        [
            self.title.is_some(),
            self.description.is_some(),
            self.prep_time.is_some(),
            self.cook_time.is_some(),
            self.serves.is_some(),
            self.category.is_some(),
            self.ingredients.is_some(),
            self.method.is_some(),
            self.nutrition.is_some(),
        ]
        .into_iter()
        .filter(|populated| *populated)
        .count()
    }
}

/// Outcome of one extraction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExtractionResult {
    Success {
        recipe: NormalizedRecipe,
    },
    /// The model produced something, but not a valid recipe.
    Incomplete {
        error: String,
        #[serde(
            rename = "partialRecipe",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        partial_recipe: Option<PartialRecipe>,
    },
    Failure {
        error: String,
    },
}

impl ExtractionResult {
    pub fn failure(error: impl Into<String>) -> Self {
        ExtractionResult::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success { .. })
    }

    pub fn recipe(&self) -> Option<&NormalizedRecipe> {
        match self {
            ExtractionResult::Success { recipe } => Some(recipe),
            _ => None,
        }
    }

    pub fn partial_recipe(&self) -> Option<&PartialRecipe> {
        match self {
            ExtractionResult::Incomplete { partial_recipe, .. } => partial_recipe.as_ref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExtractionResult::Success { .. } => None,
            ExtractionResult::Incomplete { error, .. } | ExtractionResult::Failure { error } => {
                Some(error)
            }
        }
    }

    /// Short label for logs ("success", "incomplete", "failure").
    pub fn status(&self) -> &'static str {
        match self {
            ExtractionResult::Success { .. } => "success",
            ExtractionResult::Incomplete { .. } => "incomplete",
            ExtractionResult::Failure { .. } => "failure",
        }
    }
}

/// Where a recipe comes from.
#[derive(Debug, Clone)]
pub enum RecipeSource {
    /// Free-form pasted text.
    Text(String),
    /// A public web page.
    Url(String),
    /// Raw bytes of one or more photographs.
    Photos(Vec<Vec<u8>>),
}

impl RecipeSource {
    pub fn kind(&self) -> &'static str {
        match self {
            RecipeSource::Text(_) => "text",
            RecipeSource::Url(_) => "url",
            RecipeSource::Photos(_) => "photos",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn category_tokens() {
        for category in Category::ALL {
            assert_eq!(Category::from_token(category.as_str()), Some(*category));
        }
        assert_eq!(Category::from_token("Breakfast"), None);
        assert_eq!(Category::default(), Category::Main);
    }

    #[test]
    fn partial_field_count() {
        let partial = PartialRecipe {
            title: Some("Soup".to_string()),
            serves: Some(2),
            ..Default::default()
        };
        assert_eq!(partial.field_count(), 2);
        assert_eq!(PartialRecipe::default().field_count(), 0);
    }

    #[test]
    fn extraction_result_wire_format() {
        let result = ExtractionResult::Incomplete {
            error: "incomplete".to_string(),
            partial_recipe: Some(PartialRecipe {
                title: Some("Soup".to_string()),
                prep_time: Some(5),
                ..Default::default()
            }),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "incomplete",
                "error": "incomplete",
                "partialRecipe": {"title": "Soup", "prepTime": 5}
            })
        );

        let failure = serde_json::to_value(ExtractionResult::failure("boom")).unwrap();
        assert_eq!(failure, json!({"status": "failure", "error": "boom"}));
    }

    #[test]
    fn incomplete_without_partial_omits_field() {
        let result = ExtractionResult::Incomplete {
            error: "nothing usable".to_string(),
            partial_recipe: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("partialRecipe").is_none());
        assert_eq!(result.partial_recipe(), None);
        assert_eq!(result.error(), Some("nothing usable"));
    }
}
