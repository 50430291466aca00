//! Prompt for extracting a recipe from pasted free-form text.

use super::{category_list, ingredient_rules};

/// Prompt name for cache keys.
pub const TEXT_EXTRACT_PROMPT_NAME: &str = "text_extract";

pub fn render_text_extract_prompt(text: &str) -> String {
    format!(
        r#"The user pasted the text below. Turn it into a structured recipe.

If the text does not contain a recipe (no identifiable dish, ingredients or steps), set "success" to false, explain why in "error", and fill the remaining fields with empty or null values. Otherwise set "success" to true and "error" to null.

Fields:
- "title": the recipe name.
- "description": one or two sentences, or null.
- "prepTime" / "cookTime": whole minutes, or null if not stated.
- "serves": number of servings, or null if not stated.
- "category": one of {categories}. Use "main" when unsure.
- "nutrition": estimated per-serving calories (kcal) and protein, fat and carbohydrates (grams), as whole numbers. Always estimate these, even if the text doesn't state them.

{ingredient_rules}

Every field must be present. Use null instead of leaving a field out.

Text:
"""
{text}
""""#,
        categories = category_list(),
        ingredient_rules = ingredient_rules(),
        text = text.trim(),
    )
}
