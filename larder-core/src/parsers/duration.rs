use std::sync::LazyLock;

use regex::Regex;

/// `P[nD]T[nH][nM][nS]`, case-insensitive. Seconds may carry a fraction.
static ISO_DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?$")
        .expect("Invalid ISO duration regex")
});

/// Convert an ISO-8601 style duration ("PT1H30M") into whole minutes.
///
/// Missing components count as zero and leftover seconds round up to the next
/// minute. Anything that isn't a duration token yields 0.
pub fn parse_duration(raw: Option<&str>) -> u32 {
    raw.and_then(iso_duration_minutes).unwrap_or(0)
}

/// Like [`parse_duration`], but `None` when `raw` is not a duration token.
pub fn iso_duration_minutes(raw: &str) -> Option<u32> {
    let caps = ISO_DURATION_REGEX.captures(raw.trim())?;

    let component = |idx: usize| -> u64 {
        caps.get(idx)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    let days = component(1);
    let hours = component(2);
    let minutes = component(3);
    let seconds = caps
        .get(4)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0);

    let total = days
        .saturating_mul(1440)
        .saturating_add(hours.saturating_mul(60))
        .saturating_add(minutes)
        .saturating_add((seconds / 60.0).ceil() as u64);

    Some(u32::try_from(total).unwrap_or(u32::MAX))
}
