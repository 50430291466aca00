//! Turn a fetched web page into model input: readable text, the page's own
//! schema.org Recipe JSON-LD (if any) and its og:image.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Node, Selector};
use serde_json::Value as JsonValue;
use url::Url;

/// Default cap on readable text sent to the model.
pub const DEFAULT_MAX_PAGE_CHARS: usize = 20_000;

/// Regex to find JSON-LD script tags (case-insensitive for type attribute)
static JSONLD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("Invalid JSON-LD regex")
});

/// og:image, property before content
static OG_IMAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*property\s*=\s*["']og:image["'][^>]*content\s*=\s*["']([^"']+)["'][^>]*/?\s*>"#)
        .expect("Invalid og:image regex")
});

/// og:image, content before property
static OG_IMAGE_REGEX_ALT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]*content\s*=\s*["']([^"']+)["'][^>]*property\s*=\s*["']og:image["'][^>]*/?\s*>"#)
        .expect("Invalid og:image alt regex")
});

/// Elements whose text is never readable content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "head", "nav", "footer", "form",
];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "br", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "header", "ul", "ol", "table", "blockquote", "pre", "dd", "dt",
];

/// JSON-LD keys that only cost tokens.
const NOISY_JSONLD_KEYS: &[&str] = &["review", "comment", "aggregateRating", "video"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub title: Option<String>,
    /// Visible text, one block per line, capped in length.
    pub text: String,
    /// The embedded schema.org Recipe object, if the page has one.
    pub recipe_json_ld: Option<JsonValue>,
    /// Absolute og:image URL.
    pub image_url: Option<String>,
}

impl PageContent {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.recipe_json_ld.is_none()
    }

    /// The JSON-LD recipe, pretty-printed for the prompt.
    pub fn recipe_json_ld_text(&self) -> Option<String> {
        self.recipe_json_ld
            .as_ref()
            .and_then(|json| serde_json::to_string_pretty(json).ok())
    }
}

/// Extract everything the page prompt needs from `html`.
///
/// Plain-text documents can be passed through as-is; they simply have no
/// markup to strip.
pub fn extract_page_content(html: &str, page_url: &Url, max_chars: usize) -> PageContent {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let text = readable_text(&document);
    let text = truncate_chars(&text, max_chars);

    let recipe_json_ld = find_recipe_json_ld(html).map(|mut recipe| {
        if let Some(obj) = recipe.as_object_mut() {
            for key in NOISY_JSONLD_KEYS {
                obj.remove(*key);
            }
        }
        recipe
    });

    let image_url = extract_og_image(html).and_then(|href| page_url.join(&href).ok());

    PageContent {
        title,
        text,
        recipe_json_ld,
        image_url: image_url.map(String::from),
    }
}

fn readable_text(document: &Html) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for node in document.root_element().descendants() {
        match node.value() {
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => {
                flush_line(&mut current, &mut lines);
            }
            Node::Text(text) => {
                let skipped = node.ancestors().any(|ancestor| {
                    matches!(ancestor.value(), Node::Element(el) if SKIPPED_ELEMENTS.contains(&el.name()))
                });
                if skipped {
                    continue;
                }
                for word in text.split_whitespace() {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(word);
                }
            }
            _ => {}
        }
    }
    flush_line(&mut current, &mut lines);

    lines.join("\n")
}

fn flush_line(current: &mut String, lines: &mut Vec<String>) {
    if !current.is_empty() {
        lines.push(std::mem::take(current));
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// First schema.org Recipe found in any JSON-LD block.
pub fn find_recipe_json_ld(html: &str) -> Option<JsonValue> {
    JSONLD_REGEX.captures_iter(html).find_map(|cap| {
        let sanitized = sanitize_json(cap.get(1)?.as_str());
        let json: JsonValue = serde_json::from_str(&sanitized).ok()?;
        find_recipe_in_json(&json).cloned()
    })
}

/// Escape raw control characters inside JSON strings, which some sites emit.
fn sanitize_json(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in json.chars() {
        if in_string {
            match c {
                _ if escaped => {
                    escaped = false;
                    result.push(c);
                }
                '\\' => {
                    escaped = true;
                    result.push(c);
                }
                '"' => {
                    in_string = false;
                    result.push(c);
                }
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '\t' => result.push_str("\\t"),
                c if c.is_control() => {}
                c => result.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
        }
    }

    result
}

fn is_recipe_type(value: &JsonValue) -> bool {
    match value {
        JsonValue::String(s) => s == "Recipe",
        JsonValue::Array(types) => types.iter().any(|t| t == "Recipe"),
        _ => false,
    }
}

fn find_recipe_in_json(json: &JsonValue) -> Option<&JsonValue> {
    match json {
        JsonValue::Object(obj) => {
            if obj.get("@type").is_some_and(is_recipe_type) {
                return Some(json);
            }
            obj.values().find_map(find_recipe_in_json)
        }
        JsonValue::Array(items) => items.iter().find_map(find_recipe_in_json),
        _ => None,
    }
}

fn extract_og_image(html: &str) -> Option<String> {
    OG_IMAGE_REGEX
        .captures(html)
        .or_else(|| OG_IMAGE_REGEX_ALT.captures(html))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|href| !href.is_empty())
}
