//! Menu page extraction.
//!
//! School menu pages have no common format, so extraction is layered:
//! JSON blobs inside script tags first (menu widgets usually embed their
//! data that way), then HTML list items, then bare text lines. The first
//! layer that yields anything wins. Everything here is best effort; a
//! page that yields nothing is a valid zero-item import.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

const MAX_ITEMS: usize = 100;
const MAX_ITEM_LEN: usize = 80;
const MIN_ITEM_LEN: usize = 3;

/// JSON keys whose string values name a food item.
const ITEM_KEYS: &[&str] = &["name", "item", "item_name", "itemName", "title"];

/// Lowercase fragments that mark a line as page chrome, not food.
const CHROME_WORDS: &[&str] = &[
    "login",
    "log in",
    "sign in",
    "sign up",
    "cookie",
    "privacy",
    "copyright",
    "subscribe",
    "skip to",
    "javascript",
    "all rights reserved",
];

static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>(.*?)</script>").unwrap());
static STYLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>(.*?)</style>").unwrap());
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li>").unwrap());
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Extracts candidate item names from a menu page, sanitized and deduped,
/// capped at [`MAX_ITEMS`].
pub fn extract_items(html: &str) -> Vec<String> {
    let layers: [fn(&str) -> Vec<String>; 3] =
        [from_script_json, from_list_items, from_plain_text];

    for layer in layers {
        let items = dedupe(layer(html));
        if !items.is_empty() {
            return items;
        }
    }

    Vec::new()
}

fn from_script_json(html: &str) -> Vec<String> {
    let mut items = Vec::new();

    for capture in SCRIPT_TAG.captures_iter(html) {
        let body = capture[1].trim();

        // A script body is rarely pure JSON; settle for the outermost
        // brace-to-brace span and let the parser judge it.
        let Some(start) = body.find(['{', '[']) else {
            continue;
        };
        let Some(end) = body.rfind(['}', ']']) else {
            continue;
        };
        if end <= start {
            continue;
        }

        if let Ok(value) = serde_json::from_str::<Value>(&body[start..=end]) {
            collect_item_names(&value, &mut items);
        }
    }

    items
}

fn collect_item_names(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if let Value::String(s) = child {
                    if ITEM_KEYS.contains(&key.as_str()) {
                        out.push(s.clone());
                    }
                } else {
                    collect_item_names(child, out);
                }
            }
        }
        Value::Array(values) => {
            for child in values {
                collect_item_names(child, out);
            }
        }
        _ => {}
    }
}

fn from_list_items(html: &str) -> Vec<String> {
    LIST_ITEM
        .captures_iter(html)
        .map(|c| strip_tags(&c[1]))
        .collect()
}

fn from_plain_text(html: &str) -> Vec<String> {
    let without_scripts = SCRIPT_TAG.replace_all(html, " ");
    let without_styles = STYLE_TAG.replace_all(&without_scripts, " ");

    // Block-level closers become line breaks so adjacent cells do not fuse.
    let text = ANY_TAG.replace_all(&without_styles, "\n");

    text.lines().map(|line| line.to_string()).collect()
}

fn strip_tags(fragment: &str) -> String {
    ANY_TAG.replace_all(fragment, " ").into_owned()
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Trims bullets and noise off a candidate line. Returns None when the
/// result does not look like a food item.
fn sanitize_item(raw: &str) -> Option<String> {
    let decoded = decode_entities(raw);
    let collapsed = WHITESPACE.replace_all(&decoded, " ");
    let trimmed = collapsed
        .trim()
        .trim_start_matches(['-', '*', '•', '·'])
        .trim();

    if trimmed.len() < MIN_ITEM_LEN || trimmed.len() > MAX_ITEM_LEN {
        return None;
    }
    if !trimmed.chars().any(|c| c.is_alphabetic()) {
        return None;
    }

    let letters = trimmed.chars().filter(|c| c.is_alphabetic()).count();
    let digits = trimmed.chars().filter(|c| c.is_ascii_digit()).count();
    if digits > letters {
        return None;
    }

    if trimmed.split_whitespace().count() > 8 {
        return None;
    }

    let lowered = trimmed.to_lowercase();
    if CHROME_WORDS.iter().any(|w| lowered.contains(w)) {
        return None;
    }

    Some(trimmed.to_string())
}

fn dedupe(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for candidate in raw {
        let Some(item) = sanitize_item(&candidate) else {
            continue;
        };
        if seen.insert(item.to_lowercase()) {
            items.push(item);
        }
        if items.len() >= MAX_ITEMS {
            break;
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_blob_in_script_tag_wins() {
        let html = r#"
            <html><head>
            <script type="application/json">
                {"menu":{"items":[{"name":"Turkey Chili"},{"name":"Garden Salad"}]}}
            </script>
            </head><body><ul><li>Not the menu</li></ul></body></html>
        "#;

        let items = extract_items(html);
        assert_eq!(items, vec!["Turkey Chili", "Garden Salad"]);
    }

    #[test]
    fn falls_back_to_list_items() {
        let html = r#"
            <body>
                <ul class="menu">
                    <li><span>Cheese Pizza</span></li>
                    <li>Veggie Wrap &amp; Chips</li>
                    <li>Sign in to see more</li>
                </ul>
            </body>
        "#;

        let items = extract_items(html);
        assert_eq!(items, vec!["Cheese Pizza", "Veggie Wrap & Chips"]);
    }

    #[test]
    fn falls_back_to_plain_text_lines() {
        let html = "<div>Baked Ziti</div><div>Roasted Carrots</div><div>© 2025 All rights reserved</div>";

        let items = extract_items(html);
        assert_eq!(items, vec!["Baked Ziti", "Roasted Carrots"]);
    }

    #[test]
    fn dedupes_case_insensitively() {
        let html = "<li>Tacos</li><li>TACOS</li><li>tacos</li>";
        assert_eq!(extract_items(html), vec!["Tacos"]);
    }

    #[test]
    fn rejects_number_heavy_and_overlong_lines() {
        let html = "<li>12345 67890</li>\
            <li>ok</li>\
            <li>This line has far too many words to plausibly be a single menu item name today</li>\
            <li>Grilled Chicken</li>";

        assert_eq!(extract_items(html), vec!["Grilled Chicken"]);
    }

    #[test]
    fn empty_page_extracts_nothing() {
        assert!(extract_items("").is_empty());
        assert!(extract_items("<html><body></body></html>").is_empty());
    }

    #[test]
    fn broken_json_falls_through_to_later_layers() {
        let html = r#"
            <script>var menu = {broken json;</script>
            <li>Minestrone Soup</li>
        "#;

        assert_eq!(extract_items(html), vec!["Minestrone Soup"]);
    }
}
