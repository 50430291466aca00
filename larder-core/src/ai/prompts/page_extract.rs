//! Prompt for extracting a recipe from a fetched web page.

use super::ingredient_rules;

/// Prompt name for cache keys.
pub const PAGE_EXTRACT_PROMPT_NAME: &str = "page_extract";

/// `page_text` is the readable text of the page; `structured_data` is the
/// page's own schema.org Recipe JSON-LD, when it has one.
pub fn render_page_extract_prompt(
    url: &str,
    page_text: &str,
    structured_data: Option<&str>,
) -> String {
    let structured = match structured_data {
        Some(json) => format!(
            "\nThe page also embeds this schema.org Recipe data. Prefer it where it agrees with the text:\n```json\n{json}\n```\n"
        ),
        None => String::new(),
    };

    format!(
        r#"Extract the main recipe from the web page below.

Fields, in schema.org style:
- "title": the recipe name.
- "description": one or two sentences, or null.
- "prepTime" / "cookTime": ISO-8601 durations such as "PT15M" or "PT1H30M", or null if not stated.
- "recipeYield": the yield as written, e.g. "Serves 4-6", or null.
- "recipeCategory": the category labels the page uses, e.g. ["Dessert"]. Empty if none.
- "nutrition": per-serving amounts as written, e.g. "250 kcal", "12g". null if the page gives no nutrition; individual amounts may be null.
- "imageUrl": absolute URL of the main recipe photo, or null.
- "author": the recipe author, or null.

{ingredient_rules}

Every field must be present. Use null instead of leaving a field out.

Page URL: {url}
{structured}
Page text:
"""
{page_text}
""""#,
        ingredient_rules = ingredient_rules(),
    )
}
