// Resilient JSON extraction from free-text model replies

use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;
use thiserror::Error;

static LEADING_FENCE: OnceLock<Regex> = OnceLock::new();
static TRAILING_FENCE: OnceLock<Regex> = OnceLock::new();

fn leading_fence() -> &'static Regex {
    LEADING_FENCE.get_or_init(|| Regex::new(r"(?i)^```(?:json)?\s*").unwrap())
}

fn trailing_fence() -> &'static Regex {
    TRAILING_FENCE.get_or_init(|| Regex::new(r"\s*```$").unwrap())
}

/// Raised under the hard policy when a stage reply cannot be parsed
#[derive(Debug, Clone, Error)]
#[error("Could not parse {stage} analysis from model output")]
pub struct ExtractionError {
    pub stage: String,
    pub raw: String,
}

/// What to do when a reply contains no parseable JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionPolicy {
    /// Substitute the parse-failure sentinel and keep going
    #[default]
    Soft,
    /// Abort the stage with an [`ExtractionError`]
    Hard,
}

impl ExtractionPolicy {
    /// Parse a policy name (`soft` or `hard`, case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "soft" => Some(Self::Soft),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soft => "soft",
            Self::Hard => "hard",
        }
    }

    /// Extract a stage result from `raw`, applying this policy on failure
    pub fn apply(&self, stage: &str, raw: &str) -> Result<Value, ExtractionError> {
        if let Some(value) = extract_json(raw) {
            return Ok(value);
        }
        match self {
            Self::Soft => Ok(parse_error_sentinel(raw)),
            Self::Hard => Err(ExtractionError {
                stage: stage.to_string(),
                raw: raw.to_string(),
            }),
        }
    }
}

/// The placeholder stored in place of a stage result that could not be parsed
pub fn parse_error_sentinel(raw: &str) -> Value {
    json!({ "parseError": true, "raw": raw })
}

/// Whether a stage result is the parse-failure sentinel
pub fn is_parse_error(value: &Value) -> bool {
    value.get("parseError").and_then(|v| v.as_bool()) == Some(true)
}

/// Extract a JSON object from a model reply.
///
/// Tries, in order: the reply with surrounding whitespace and code fences
/// removed, then the span from the first `{` to the last `}` of that text.
/// Only JSON objects are accepted.
pub fn extract_json(raw: &str) -> Option<Value> {
    let cleaned = strip_code_fences(raw.trim());

    if let Some(value) = parse_object(&cleaned) {
        return Some(value);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&cleaned[start..=end])
}

fn strip_code_fences(text: &str) -> String {
    let without_leading = leading_fence().replace(text, "");
    trailing_fence().replace(&without_leading, "").into_owned()
}

fn parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json() {
        let value = extract_json("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_fence_without_tag_and_uppercase_tag() {
        assert_eq!(extract_json("```\n{\"a\":1}\n```"), Some(json!({"a": 1})));
        assert_eq!(extract_json("```JSON\n{\"a\":1}```"), Some(json!({"a": 1})));
    }

    #[test]
    fn test_surrounding_prose_uses_brace_scan() {
        let value = extract_json("Sure! {\"a\":1} done.").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_nested_objects_span_first_to_last_brace() {
        let raw = "Here you go:\n{\"outer\": {\"inner\": [1, 2]}}\nHope this helps!";
        assert_eq!(
            extract_json(raw),
            Some(json!({"outer": {"inner": [1, 2]}}))
        );
    }

    #[test]
    fn test_plain_text_fails() {
        assert!(extract_json("not json at all").is_none());
        assert!(extract_json("").is_none());
        assert!(extract_json("} backwards {").is_none());
    }

    #[test]
    fn test_non_object_json_rejected() {
        assert!(extract_json("[1, 2, 3]").is_none());
        assert!(extract_json("42").is_none());
    }

    #[test]
    fn test_two_objects_with_prose_between_fail() {
        assert!(extract_json("{\"a\":1} and also {\"b\":2}").is_none());
    }

    #[test]
    fn test_soft_policy_returns_sentinel() {
        let value = ExtractionPolicy::Soft
            .apply("market", "not json at all")
            .unwrap();
        assert!(is_parse_error(&value));
        assert_eq!(value["raw"], "not json at all");
    }

    #[test]
    fn test_hard_policy_errors() {
        let err = ExtractionPolicy::Hard
            .apply("technical", "not json at all")
            .unwrap_err();
        assert_eq!(err.stage, "technical");
        assert_eq!(err.raw, "not json at all");
        assert_eq!(
            err.to_string(),
            "Could not parse technical analysis from model output"
        );
    }

    #[test]
    fn test_policies_agree_on_success() {
        for policy in [ExtractionPolicy::Soft, ExtractionPolicy::Hard] {
            let value = policy.apply("market", "```json\n{\"ok\":true}\n```").unwrap();
            assert_eq!(value, json!({"ok": true}));
            assert!(!is_parse_error(&value));
        }
    }

    #[test]
    fn test_policy_from_name() {
        assert_eq!(ExtractionPolicy::from_name("soft"), Some(ExtractionPolicy::Soft));
        assert_eq!(ExtractionPolicy::from_name(" HARD "), Some(ExtractionPolicy::Hard));
        assert_eq!(ExtractionPolicy::from_name("lenient"), None);
    }
}
