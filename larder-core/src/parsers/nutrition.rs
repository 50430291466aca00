use std::sync::LazyLock;

use regex::Regex;

/// Unit alternatives, longest first so "milligrams" wins over "mg" and "g".
const UNIT_PATTERN: &str = r"(milligrams?|mg|grams?|g|kcal|calories?|cal)";

/// "10-15g", "100 to 500 mg", "5–8 grams"
static RANGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(\d+(?:\.\d+)?)\s*(?:-|–|—|to)\s*(\d+(?:\.\d+)?)\s*{UNIT_PATTERN}?"
    ))
    .expect("Invalid nutrition range regex")
});

/// "20g", "1500mg", "300 calories", "0.5"
static SINGLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(\d+(?:\.\d+)?)\s*{UNIT_PATTERN}?"))
        .expect("Invalid nutrition value regex")
});

/// Thousands separators between digits ("1,500mg").
static THOUSANDS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d),(\d{3})").expect("Invalid thousands regex"));

/// Spread above which a milligram range is treated as a wide estimate.
const HIGH_RANGE_SPREAD_MG: f64 = 100.0;
/// Spread above which any other range is treated as a wide estimate.
const HIGH_RANGE_SPREAD: f64 = 10.0;

/// Parse a free-text nutrition amount into a whole number of grams (or
/// calories, for energy values).
///
/// Ranges resolve to their midpoint when the spread is wide and to the upper
/// bound otherwise. Milligram amounts are converted to grams. The result is
/// always rounded up. Returns `None` when no number can be found.
pub fn parse_nutrition_value(raw: Option<&str>) -> Option<u32> {
    let text = THOUSANDS_REGEX.replace_all(raw?.trim(), "$1$2");

    let value = if let Some(caps) = RANGE_REGEX.captures(&text) {
        let low: f64 = caps.get(1)?.as_str().parse().ok()?;
        let high: f64 = caps.get(2)?.as_str().parse().ok()?;
        let milligrams = caps.get(3).is_some_and(|m| is_milligram_unit(m.as_str()));

        let threshold = if milligrams {
            HIGH_RANGE_SPREAD_MG
        } else {
            HIGH_RANGE_SPREAD
        };
        let amount = if (high - low) > threshold {
            (low + high) / 2.0
        } else {
            high
        };
        to_grams(amount, milligrams)
    } else {
        let caps = SINGLE_REGEX.captures(&text)?;
        let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
        let milligrams = caps.get(2).is_some_and(|m| is_milligram_unit(m.as_str()));
        to_grams(amount, milligrams)
    };

    let rounded = value.ceil();
    if !rounded.is_finite() || rounded < 0.0 || rounded > f64::from(u32::MAX) {
        return None;
    }
    Some(rounded as u32)
}

fn is_milligram_unit(unit: &str) -> bool {
    let unit = unit.to_ascii_lowercase();
    unit == "mg" || unit.starts_with("milligram")
}

fn to_grams(amount: f64, milligrams: bool) -> f64 {
    if milligrams {
        amount / 1000.0
    } else {
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_values() {
        assert_eq!(parse_nutrition_value(Some("20g")), Some(20));
        assert_eq!(parse_nutrition_value(Some("20 grams")), Some(20));
        assert_eq!(parse_nutrition_value(Some("300 calories")), Some(300));
        assert_eq!(parse_nutrition_value(Some("450 kcal")), Some(450));
        assert_eq!(parse_nutrition_value(Some("12")), Some(12));
    }

    #[test]
    fn fractions_round_up() {
        assert_eq!(parse_nutrition_value(Some("0.5g")), Some(1));
        assert_eq!(parse_nutrition_value(Some("7.1 g")), Some(8));
        assert_eq!(parse_nutrition_value(Some("0g")), Some(0));
    }

    #[test]
    fn milligrams_convert_to_grams() {
        assert_eq!(parse_nutrition_value(Some("1500mg")), Some(2));
        assert_eq!(parse_nutrition_value(Some("250 milligrams")), Some(1));
        assert_eq!(parse_nutrition_value(Some("1,500 mg")), Some(2));
    }

    #[test]
    fn narrow_range_takes_upper_bound() {
        assert_eq!(parse_nutrition_value(Some("10-15g")), Some(15));
        assert_eq!(parse_nutrition_value(Some("5 to 8 grams")), Some(8));
        assert_eq!(parse_nutrition_value(Some("200-300mg")), Some(1));
    }

    #[test]
    fn wide_range_takes_midpoint() {
        assert_eq!(parse_nutrition_value(Some("10-30g")), Some(20));
        assert_eq!(parse_nutrition_value(Some("300-500 calories")), Some(400));
        // 300mg midpoint, 0.3g rounded up.
        assert_eq!(parse_nutrition_value(Some("100-500mg")), Some(1));
        assert_eq!(parse_nutrition_value(Some("1000-3000mg")), Some(2));
    }

    #[test]
    fn threshold_is_exclusive() {
        // Spread of exactly 10 is not "high".
        assert_eq!(parse_nutrition_value(Some("10-20g")), Some(20));
        assert_eq!(parse_nutrition_value(Some("10-21g")), Some(16));
    }

    #[test]
    fn unrecognized_is_none() {
        assert_eq!(parse_nutrition_value(None), None);
        assert_eq!(parse_nutrition_value(Some("")), None);
        assert_eq!(parse_nutrition_value(Some("a little")), None);
    }
}
