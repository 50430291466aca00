//! Heuristic scalar parsers.
//!
//! Every parser here is total: unparseable input degrades to `None` or a
//! documented default and never aborts the surrounding extraction.

mod category;
mod duration;
mod nutrition;
mod servings;

pub use category::{map_category, map_category_value};
pub use duration::{iso_duration_minutes, parse_duration};
pub use nutrition::parse_nutrition_value;
pub use servings::{parse_servings, servings_in, DEFAULT_SERVINGS};
