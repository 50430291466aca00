use std::sync::LazyLock;

use regex::Regex;

/// Serving count used when the yield text carries no number.
pub const DEFAULT_SERVINGS: u32 = 4;

static DIGITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid digits regex"));

/// Pull a serving count out of free-form yield text.
///
/// Takes the first run of digits ("Serves 4-6 people" -> 4), falling back to
/// [`DEFAULT_SERVINGS`] when there is none.
pub fn parse_servings(raw: Option<&str>) -> u32 {
    raw.and_then(servings_in).unwrap_or(DEFAULT_SERVINGS)
}

/// First run of digits in `text`, without the default.
pub fn servings_in(text: &str) -> Option<u32> {
    DIGITS_REGEX.find(text)?.as_str().parse().ok()
}
