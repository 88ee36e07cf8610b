//! Tolerant JSON extraction from free-form model output.
//!
//! Models wrap the requested object in prose or markdown fences often enough that
//! a plain `serde_json::from_str` is not sufficient. Strategy:
//! 1. parse the whole (fence-stripped) text directly;
//! 2. otherwise find the first `{` and its true closing `}` by depth counting,
//!    skipping braces inside string literals, and parse exactly that span;
//! 3. if that span is balanced but not valid JSON, move past it and try the next
//!    top-level `{`. An unbalanced span (truncated output) stops the search.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::strip_json_fences;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in model output")]
    NoJsonFound,

    #[error("malformed JSON in model output: {0}")]
    MalformedJson(#[source] serde_json::Error),
}

/// Recovers the JSON object embedded in `raw`. No shape validation happens here.
pub fn extract_json(raw: &str) -> Result<Map<String, Value>, ExtractError> {
    if let Ok(Value::Object(object)) = serde_json::from_str::<Value>(strip_json_fences(raw)) {
        return Ok(object);
    }

    let first_open = raw.find('{').ok_or(ExtractError::NoJsonFound)?;
    if !raw[first_open..].contains('}') {
        return Err(ExtractError::NoJsonFound);
    }

    let mut first_error: Option<serde_json::Error> = None;
    let mut cursor = first_open;

    while let Some(offset) = raw[cursor..].find('{') {
        let open = cursor + offset;
        let Some(close) = matching_brace(raw, open) else {
            // Truncated: surface the parser's own EOF error for the tail.
            let tail_error = match serde_json::from_str::<Value>(&raw[open..]) {
                Ok(Value::Object(object)) => return Ok(object),
                Ok(_) => None,
                Err(e) => Some(e),
            };
            first_error = first_error.or(tail_error);
            break;
        };

        match serde_json::from_str::<Value>(&raw[open..=close]) {
            Ok(Value::Object(object)) => return Ok(object),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
        cursor = close + 1;
    }

    match first_error {
        Some(e) => Err(ExtractError::MalformedJson(e)),
        None => Err(ExtractError::NoJsonFound),
    }
}

/// Byte index of the `}` closing the `{` at `open`, or `None` if it never closes.
///
/// Scans bytes: the structural characters are ASCII and never occur inside a
/// multi-byte UTF-8 sequence.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(o) => o,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn test_plain_json_parses_directly() {
        let parsed = extract_json(r#"{"summary":"ok","overallScore":7}"#).unwrap();
        assert_eq!(parsed["summary"], "ok");
        assert_eq!(parsed["overallScore"], 7);
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"summary\": \"fenced\"}\n```";
        assert_eq!(extract_json(raw).unwrap()["summary"], "fenced");
    }

    #[test]
    fn test_surrounding_prose_round_trips() {
        let original = json!({
            "summary": "Strong backend profile",
            "overallScore": 8,
            "strengths": ["Rust", "distributed systems"],
            "nested": {"deep": {"list": [1, 2, {"x": null}]}},
            "tricky": "braces } inside { strings and \"quotes\""
        });
        let raw = format!("prefix text {} suffix text", original);

        let parsed = extract_json(&raw).unwrap();

        assert_eq!(Value::Object(parsed), original);
    }

    #[test]
    fn test_trailing_brace_in_prose_is_ignored() {
        // A greedy first-to-last-brace match would swallow the trailing "}".
        let raw = r#"Here: {"summary":"ok"} and note the closing } above."#;
        assert_eq!(extract_json(raw).unwrap()["summary"], "ok");
    }

    #[test]
    fn test_only_first_object_is_returned() {
        let raw = r#"{"first":1} then {"second":2}"#;
        let parsed = extract_json(raw).unwrap();
        assert!(parsed.contains_key("first"));
        assert!(!parsed.contains_key("second"));
    }

    #[test]
    fn test_skips_balanced_non_json_braces() {
        let raw = r#"Use the {placeholder} syntax. Result: {"summary":"ok"}"#;
        assert_eq!(extract_json(raw).unwrap()["summary"], "ok");
    }

    #[test]
    fn test_no_brace_is_no_json_found() {
        let err = extract_json("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonFound));
    }

    #[test]
    fn test_open_brace_without_close_is_no_json_found() {
        let err = extract_json("the set { is never closed").unwrap_err();
        assert!(matches!(err, ExtractError::NoJsonFound));
    }

    #[test]
    fn test_truncated_output_is_malformed() {
        let raw = r#"Result: {"summary":"ok","strengths":["a"],"meta":{"k":1}"#;
        let err = extract_json(raw).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedJson(_)));
    }

    #[test]
    fn test_invalid_span_is_malformed() {
        let err = extract_json("{summary: unquoted}").unwrap_err();
        assert!(matches!(err, ExtractError::MalformedJson(_)));
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let raw = r#"noise {"summary":"she said \"hi}\" loudly"} more"#;
        assert_eq!(
            extract_json(raw).unwrap(),
            object(json!({"summary": "she said \"hi}\" loudly"}))
        );
    }

    #[test]
    fn test_multibyte_text_around_object() {
        let raw = "Résumé analysé ✅ {\"summary\":\"très bien\"} fin";
        assert_eq!(extract_json(raw).unwrap()["summary"], "très bien");
    }

    #[test]
    fn test_matching_brace_positions() {
        let text = r#"a{"k":{"n":"}"}}b"#;
        assert_eq!(matching_brace(text, 1), Some(text.len() - 2));
        assert_eq!(matching_brace("{", 0), None);
    }
}
