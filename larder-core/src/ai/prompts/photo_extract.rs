//! Prompt template for extracting recipes from photos.

use super::ingredient_rules;

pub const PHOTO_EXTRACT_PROMPT_NAME: &str = "photo_extract";

pub fn render_photo_extract_prompt(image_count: usize) -> String {
    let photos = if image_count == 1 {
        "a photo".to_string()
    } else {
        format!("{image_count} photos")
    };

    format!(
        r#"You are given {photos} of a recipe from a cookbook, card or printed page. The photos may show different parts of the same recipe; combine them into one.

Fields, in schema.org style:
- "title": the recipe name, exactly as written.
- "description": the introduction, or null.
- "prepTime" / "cookTime": ISO-8601 durations such as "PT15M", or null if not stated.
- "recipeYield": the yield as written, e.g. "Serves 4", or null.
- "recipeCategory": category labels if any are printed, otherwise empty.
- "nutrition": per-serving amounts as printed, or null if none are shown.
- "imageUrl": always null.
- "author": the author if printed, or null.

{ingredient_rules}

Copy names and instructions as written; do not paraphrase. Every field must be present. Use null instead of leaving a field out."#,
        ingredient_rules = ingredient_rules(),
    )
}
