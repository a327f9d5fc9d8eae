//! Structured event descriptor extraction from raw HTML.
//!
//! Pages embed machine-readable event metadata as JSON-LD. The extractor
//! scans every `application/ld+json` block, skipping malformed ones, and
//! accepts the first whose declared type is `Event` (standalone, inside an
//! array, or inside a `@graph`). Some platforms instead embed the descriptor
//! as an escaped JSON string inside another JSON property; when no
//! standalone block matches, a second pass unescapes and parses those.
//!
//! A `None` result is not an error: it tells the strategy chain to try the
//! next approach.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::types::RawEventDescriptor;

pub fn extract(html: &str) -> Option<RawEventDescriptor> {
    let document = Html::parse_document(html);

    let ld_selector = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    for script in document.select(&ld_selector) {
        let content = script.text().collect::<String>();
        let value = match serde_json::from_str::<Value>(&content) {
            Ok(v) => v,
            Err(_) => continue, // malformed block, keep scanning
        };
        if let Some(descriptor) = scan_block(&value) {
            debug!("Found Event descriptor in JSON-LD block");
            return Some(descriptor);
        }
    }

    // Fallback: descriptor escaped inside another JSON payload (e.g. a
    // framework data blob) rather than a standalone block
    let script_selector = Selector::parse("script").unwrap();
    for script in document.select(&script_selector) {
        let content = script.text().collect::<String>();
        if !content.contains("@type") {
            continue;
        }
        if let Ok(value) = serde_json::from_str::<Value>(&content) {
            if let Some(descriptor) = scan_deep(&value, 0) {
                debug!("Found Event descriptor embedded as escaped JSON");
                return Some(descriptor);
            }
        }
    }

    None
}

/// Checks a standalone JSON-LD block: the value itself, elements of a
/// top-level array, or entries of a `@graph`.
fn scan_block(value: &Value) -> Option<RawEventDescriptor> {
    if let Some(descriptor) = descriptor_from(value) {
        return Some(descriptor);
    }
    match value {
        Value::Array(items) => items.iter().find_map(descriptor_from),
        Value::Object(map) => map
            .get("@graph")
            .and_then(|g| g.as_array())
            .and_then(|items| items.iter().find_map(descriptor_from)),
        _ => None,
    }
}

/// Recursive walk used by the escaped-JSON fallback: descends through
/// objects and arrays, and re-parses string values that look like they hold
/// a serialized descriptor.
fn scan_deep(value: &Value, depth: usize) -> Option<RawEventDescriptor> {
    if depth > 16 {
        return None;
    }
    if let Some(descriptor) = descriptor_from(value) {
        return Some(descriptor);
    }
    match value {
        Value::Object(map) => map.values().find_map(|v| scan_deep(v, depth + 1)),
        Value::Array(items) => items.iter().find_map(|v| scan_deep(v, depth + 1)),
        Value::String(s) if s.contains("@type") => {
            let inner = serde_json::from_str::<Value>(s).ok()?;
            scan_deep(&inner, depth + 1)
        }
        _ => None,
    }
}

fn descriptor_from(value: &Value) -> Option<RawEventDescriptor> {
    if !declares_event(value) {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

fn declares_event(value: &Value) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == "Event",
        // JSON-LD allows @type to be a list
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Event")),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_event_block() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"Event","name":"Bio Meetup","startDate":"2025-06-01T18:00:00+01:00"}</script>
            </head><body></body></html>"#;
        let descriptor = extract(html).expect("descriptor");
        assert_eq!(descriptor.name.as_deref(), Some("Bio Meetup"));
    }

    #[test]
    fn skips_malformed_blocks_and_non_events() {
        let html = r#"<html><head>
            <script type="application/ld+json">{not valid json</script>
            <script type="application/ld+json">{"@type":"Organization","name":"Acme"}</script>
            <script type="application/ld+json">{"@type":"Event","name":"Second Block"}</script>
            </head></html>"#;
        let descriptor = extract(html).expect("descriptor");
        assert_eq!(descriptor.name.as_deref(), Some("Second Block"));
    }

    #[test]
    fn finds_event_inside_graph() {
        let html = r#"<script type="application/ld+json">
            {"@context":"https://schema.org","@graph":[{"@type":"WebSite"},{"@type":"Event","name":"Graph Event"}]}
            </script>"#;
        let descriptor = extract(html).expect("descriptor");
        assert_eq!(descriptor.name.as_deref(), Some("Graph Event"));
    }

    #[test]
    fn falls_back_to_escaped_descriptor() {
        let escaped =
            "{\\\"@type\\\":\\\"Event\\\",\\\"name\\\":\\\"Escaped Event\\\"}".to_string();
        let html = format!(
            r#"<script type="application/json">{{"pageProps":{{"jsonLd":"{escaped}"}}}}</script>"#
        );
        let descriptor = extract(&html).expect("descriptor");
        assert_eq!(descriptor.name.as_deref(), Some("Escaped Event"));
    }

    #[test]
    fn no_event_yields_none() {
        assert!(extract("<html><body><h1>Hello</h1></body></html>").is_none());
    }
}
