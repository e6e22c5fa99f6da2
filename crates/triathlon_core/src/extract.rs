//! crates/triathlon_core/src/extract.rs
//!
//! Recovers the JSON object from a model reply that may be wrapped in code
//! fences or surrounded by commentary.

use regex::Regex;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json(.*?)(?:```|$)").expect("valid regex"));

static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)(?:```|$)").expect("valid regex"));

/// Returns the best-effort JSON object text contained in `reply`.
///
/// Never fails: when nothing looks like an object the trimmed input comes back
/// unchanged and the parse step reports the problem.
pub fn extract_json_object(reply: &str) -> String {
    let mut content = reply.trim();

    if let Some(caps) = JSON_FENCE.captures(content) {
        content = caps.get(1).map_or("", |m| m.as_str()).trim();
    } else if let Some(caps) = ANY_FENCE.captures(content) {
        content = caps.get(1).map_or("", |m| m.as_str()).trim();
    }

    if let (Some(first), Some(last)) = (content.find('{'), content.rfind('}')) {
        if last > first {
            content = &content[first..=last];
        }
    }

    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn takes_the_json_fence_contents() {
        assert_eq!(extract_json_object("```json\n{\"a\":1}\n```"), r#"{"a":1}"#);
    }

    #[test]
    fn strips_surrounding_prose() {
        assert_eq!(extract_json_object("here you go: {\"a\":1} thanks"), r#"{"a":1}"#);
    }

    #[test]
    fn returns_trimmed_text_without_braces() {
        assert_eq!(extract_json_object("  no braces here \n"), "no braces here");
        assert_eq!(extract_json_object(""), "");
    }

    #[test]
    fn unlabeled_fence_with_chatter() {
        let reply = "Sure! Here is the plan:\n```\n{\"week_number\": 3}\n```\nGood luck.";
        assert_eq!(extract_json_object(reply), r#"{"week_number": 3}"#);
    }

    #[test]
    fn prefers_labeled_fence_over_earlier_plain_fence() {
        let reply = "```\nnot this\n```\nthen\n```json\n{\"b\":2}\n```";
        assert_eq!(extract_json_object(reply), r#"{"b":2}"#);
    }

    #[test]
    fn unterminated_fence_still_yields_object() {
        let reply = "```json\n{\"a\": {\"b\": 1}}";
        assert_eq!(extract_json_object(reply), r#"{"a": {"b": 1}}"#);
    }

    #[test]
    fn nested_objects_keep_outermost_braces() {
        let reply = "Result {\"a\": {\"b\": 1}} end";
        assert_eq!(extract_json_object(reply), r#"{"a": {"b": 1}}"#);
    }
}
