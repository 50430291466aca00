//! AI prompt templates.

pub mod page_extract;
pub mod photo_extract;
pub mod text_extract;

pub use page_extract::{render_page_extract_prompt, PAGE_EXTRACT_PROMPT_NAME};
pub use photo_extract::{render_photo_extract_prompt, PHOTO_EXTRACT_PROMPT_NAME};
pub use text_extract::{render_text_extract_prompt, TEXT_EXTRACT_PROMPT_NAME};

use crate::types::Category;
use crate::vocabulary::{CanonicalPreparation, CanonicalUnit};

/// System message sent ahead of every extraction prompt.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a recipe extraction assistant. Reply with one JSON object matching the response schema and nothing else. Only use information found in the input; never invent ingredients, steps or amounts.";

/// Shared guidance on the ingredient and method fields, listing the
/// vocabularies the model should prefer.
pub(crate) fn ingredient_rules() -> String {
    let units: Vec<&str> = CanonicalUnit::ALL.iter().map(|u| u.as_str()).collect();
    let preparations: Vec<&str> = CanonicalPreparation::ALL
        .iter()
        .map(|p| p.as_str())
        .collect();

    format!(
        r#"Ingredients:
- One entry per ingredient. "name" is the ingredient alone, without quantity or preparation.
- "amount" is a number (convert fractions: "1 1/2" -> 1.5), or null if not given.
- "unit" should be one of: {units}. Use null if there is no unit or it doesn't fit.
- "preparation" should be one of: {preparations}. Use null if none applies.

Method:
- One entry per step, in order. "title" is a short imperative summary, "description" the full instruction text (null if the step is only a title)."#,
        units = units.join(", "),
        preparations = preparations.join(", "),
    )
}

pub(crate) fn category_list() -> String {
    Category::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
