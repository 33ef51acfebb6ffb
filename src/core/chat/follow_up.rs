//! Follow-up question suggestions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::reply::strip_code_fence;
use crate::core::language::Language;

/// Most suggestions returned for one turn.
pub const MAX_FOLLOW_UPS: usize = 3;

/// Suggested next questions and the heading shown above them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUps {
    pub label: String,
    pub questions: Vec<String>,
}

impl FollowUps {
    /// No suggestions, with the label in `language`.
    pub fn empty(language: Language) -> Self {
        Self {
            label: language.follow_up_label().to_string(),
            questions: Vec::new(),
        }
    }
}

/// Parse the follow-up model output, degrading to `FollowUps::empty`.
///
/// A missing label falls back to the default label but keeps any questions.
pub fn parse_follow_ups(raw: &str, default_language: Language) -> FollowUps {
    let body = strip_code_fence(raw);
    let object = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => &body[start..=end],
        _ => {
            warn!("Follow-up reply has no JSON object");
            return FollowUps::empty(default_language);
        }
    };

    let value: Value = match serde_json::from_str(object) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Follow-up reply is not valid JSON");
            return FollowUps::empty(default_language);
        }
    };

    let label = value
        .get("label")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default_language.follow_up_label())
        .to_string();

    let questions = value
        .get("questions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .take(MAX_FOLLOW_UPS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    FollowUps { label, questions }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translated_label_and_questions() {
        let raw = r#"{"label":"AIおすすめの質問","questions":["駐車場は？","料金は？"]}"#;
        let parsed = parse_follow_ups(raw, Language::Ko);
        assert_eq!(parsed.label, "AIおすすめの質問");
        assert_eq!(parsed.questions, vec!["駐車場は？", "料金は？"]);
    }

    #[test]
    fn test_at_most_three_non_empty_questions() {
        let raw = r#"```json
{"label":"AI suggested questions","questions":["a"," ","b",7,"c","d"]}
```"#;
        let parsed = parse_follow_ups(raw, Language::En);
        assert_eq!(parsed.questions, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_garbage_degrades_to_empty() {
        assert_eq!(
            parse_follow_ups("no idea", Language::Ko),
            FollowUps::empty(Language::Ko)
        );
        assert_eq!(
            parse_follow_ups("{broken", Language::Ko),
            FollowUps::empty(Language::Ko)
        );
    }

    #[test]
    fn test_missing_label_uses_default() {
        let parsed = parse_follow_ups(r#"{"questions":["x"]}"#, Language::Zh);
        assert_eq!(parsed.label, "AI推荐问题");
        assert_eq!(parsed.questions, vec!["x"]);
    }
}
