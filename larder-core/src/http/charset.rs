//! Charset detection and transcoding for fetched pages.

use std::sync::LazyLock;

use encoding_rs::Encoding;
use regex::bytes::Regex;

/// Only the start of a document is scanned for a meta charset.
const META_SCAN_BYTES: usize = 1024;

/// `<meta charset="x">` and the `http-equiv` form's `content="...; charset=x"`.
static META_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*?charset\s*=\s*["']?\s*([A-Za-z0-9_:.\-]+)"#)
        .expect("Invalid meta charset regex")
});

/// Decode a response body to UTF-8.
///
/// The Content-Type charset wins, then a meta charset near the top of the
/// document, then UTF-8 (lossy, so invalid bytes become U+FFFD).
pub fn decode_bytes_to_utf8(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_html_meta(bytes))
        .unwrap_or(encoding_rs::UTF_8);

    let (decoded, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = encoding.name(), "replaced undecodable bytes");
    }
    decoded.into_owned()
}

/// "text/html; charset=iso-8859-1" -> windows-1252
fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches(['"', '\'']))
        .filter(|value| !value.is_empty())
        .and_then(|value| Encoding::for_label(value.as_bytes()))
}

fn charset_from_html_meta(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(META_SCAN_BYTES)];
    let caps = META_CHARSET_REGEX.captures(head)?;
    Encoding::for_label(caps.get(1)?.as_bytes())
}
