// Data models shared by the analysis pipeline, the result store and the HTTP layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Skill level used when the request omits one or sends a blank value
pub const DEFAULT_SKILL_LEVEL: &str = "intermediate";

/// Maximum number of competitor names carried from the market stage into the sentiment stage
pub const MAX_SENTIMENT_COMPETITORS: usize = 5;

/// Structured output of a single stage.
///
/// Always a JSON object; may be the parse-failure sentinel
/// `{"parseError": true, "raw": "..."}` under the soft extraction policy.
pub type StageResult = Value;

/// A validated analysis request. The idea is kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub idea: String,
    pub skill_level: String,
}

impl AnalysisRequest {
    /// Build a request, rejecting blank ideas and defaulting a blank skill level.
    pub fn new(idea: Option<String>, skill_level: Option<String>) -> Option<Self> {
        let idea = idea.filter(|i| !i.trim().is_empty())?;
        let skill_level = skill_level
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_SKILL_LEVEL.to_string());
        Some(Self { idea, skill_level })
    }
}

/// Collect the competitor names a market stage result mentions.
///
/// Only the `name` of each entry is read; the other fields are free-form model
/// output and may have any shape. Entries without a string name are skipped.
/// Names are trimmed, deduplicated case-insensitively and capped at
/// [`MAX_SENTIMENT_COMPETITORS`].
pub fn competitor_names(market: &Value) -> Vec<String> {
    let Some(entries) = market.get("competitors").and_then(|c| c.as_array()) else {
        return Vec::new();
    };

    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        let Some(name) = entry.get("name").and_then(Value::as_str).map(str::trim) else {
            continue;
        };
        if name.is_empty() || names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            continue;
        }
        names.push(name.to_string());
        if names.len() == MAX_SENTIMENT_COMPETITORS {
            break;
        }
    }
    names
}

/// The aggregate result of one complete pipeline run.
///
/// Only ever built once all five stages have produced a result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    pub idea: String,
    pub skill_level: String,
    pub market: StageResult,
    pub technical: StageResult,
    pub opportunity: StageResult,
    pub deployment: StageResult,
    pub sentiment: StageResult,
    pub created_at: DateTime<Utc>,
}

/// Generate a fresh result identifier
pub fn new_result_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_rejects_blank_idea() {
        assert!(AnalysisRequest::new(None, None).is_none());
        assert!(AnalysisRequest::new(Some(String::new()), None).is_none());
        assert!(AnalysisRequest::new(Some("  \n\t ".to_string()), None).is_none());
    }

    #[test]
    fn test_request_keeps_idea_verbatim() {
        let req = AnalysisRequest::new(Some("  padded idea ".to_string()), None).unwrap();
        assert_eq!(req.idea, "  padded idea ");
        assert_eq!(req.skill_level, DEFAULT_SKILL_LEVEL);
    }

    #[test]
    fn test_request_blank_skill_level_uses_default() {
        let req =
            AnalysisRequest::new(Some("idea".to_string()), Some("   ".to_string())).unwrap();
        assert_eq!(req.skill_level, DEFAULT_SKILL_LEVEL);

        let req =
            AnalysisRequest::new(Some("idea".to_string()), Some("beginner".to_string())).unwrap();
        assert_eq!(req.skill_level, "beginner");
    }

    #[test]
    fn test_competitor_names_dedup_and_skip() {
        let market = json!({
            "competitors": [
                {"name": "Planta"},
                {"name": " planta "},
                {"url": "https://nameless.example"},
                "not an object",
                {"name": ""},
                {"name": "Greg", "strengths": ["reminders"]}
            ]
        });
        assert_eq!(competitor_names(&market), vec!["Planta", "Greg"]);
    }

    #[test]
    fn test_competitor_names_ignore_malformed_sibling_fields() {
        let market = json!({
            "competitors": [
                {"name": "Planta", "strengths": null},
                {"name": "Greg", "weaknesses": "too pricey"},
                {"name": "Blossom", "url": 42},
                {"name": 7}
            ]
        });
        assert_eq!(competitor_names(&market), vec!["Planta", "Greg", "Blossom"]);
    }

    #[test]
    fn test_competitor_names_capped() {
        let competitors: Vec<Value> = (0..8).map(|i| json!({"name": format!("C{}", i)})).collect();
        let market = json!({ "competitors": competitors });
        assert_eq!(competitor_names(&market).len(), MAX_SENTIMENT_COMPETITORS);
    }

    #[test]
    fn test_competitor_names_missing_or_sentinel() {
        assert!(competitor_names(&json!({})).is_empty());
        assert!(competitor_names(&json!({"parseError": true, "raw": "oops"})).is_empty());
        assert!(competitor_names(&json!({"competitors": "none"})).is_empty());
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = AnalysisRecord {
            id: new_result_id(),
            idea: "idea".to_string(),
            skill_level: "beginner".to_string(),
            market: json!({}),
            technical: json!({}),
            opportunity: json!({}),
            deployment: json!({}),
            sentiment: json!({}),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("skillLevel").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(uuid::Uuid::parse_str(value["id"].as_str().unwrap()).is_ok());
    }
}
