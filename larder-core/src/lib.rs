pub mod ai;
pub mod canonicalize;
pub mod error;
pub mod extract;
pub mod http;
pub mod image;
pub mod page;
pub mod parsers;
pub mod partial;
pub mod schema;
pub mod types;
pub mod vocabulary;

pub use canonicalize::{
    canonicalize_preparation, canonicalize_unit, normalize_page_candidate,
    normalize_text_candidate,
};
pub use error::FetchError;
pub use extract::{ExtractError, Extractor, ExtractorConfig, INCOMPLETE_MESSAGE};
pub use http::{ContentFetcher, DnsUrlGuard, FakeUrlGuard, MockFetcher, UrlGuard, UrlValidation};
pub use image::{validate_image, MAX_FILE_SIZE, MAX_IMAGES};
pub use parsers::{map_category, parse_duration, parse_nutrition_value, parse_servings};
pub use partial::extract_partial_recipe;
pub use schema::{PageCandidate, TextCandidate};
pub use types::{
    Category, ExtractionResult, MethodStep, NormalizedRecipe, NutritionInfo, PartialRecipe,
    RecipeSource, StructuredIngredient,
};
pub use vocabulary::{CanonicalPreparation, CanonicalUnit};
