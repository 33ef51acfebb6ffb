//! Parse and repair of model replies.
//!
//! Model output is untrusted text. `parse_reply` always yields a
//! `StructuredReply` with a non-empty summary: first the full JSON object is
//! tried, then only the `summary` field is salvaged, and finally a localized
//! apology is substituted.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

use super::cards::{DetailCard, normalize_cards};
use crate::core::language::Language;

/// Matches a `"summary": "..."` pair inside otherwise broken JSON.
static SUMMARY_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#""summary"\s*:\s*"((?:[^"\\]|\\.)*)""#).ok());

/// Why the strict parse of a reply failed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("No JSON object found in reply")]
    NoJsonObject,

    #[error("Reply is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Reply has no non-empty summary")]
    MissingSummary,
}

/// Which stage of the pipeline produced the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The whole object parsed
    Exact,
    /// Only the summary could be recovered
    SummaryOnly,
    /// Nothing usable; the apology was substituted
    Fallback,
}

/// The model's answer in its fixed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReply {
    pub summary: String,
    #[serde(default)]
    pub cards: Vec<DetailCard>,
}

impl StructuredReply {
    /// Reply with only a summary.
    pub fn text(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            cards: Vec::new(),
        }
    }

    /// The localized apology used when nothing could be extracted.
    pub fn apology(language: Language) -> Self {
        Self::text(language.apology())
    }
}

/// A reply together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub reply: StructuredReply,
    pub outcome: ParseOutcome,
}

/// Remove a surrounding Markdown code fence, with or without a `json` tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    let rest = match rest.rfind("```") {
        Some(end) => &rest[..end],
        None => rest,
    };
    rest.trim()
}

/// Slice from the first `{` to the last `}`.
fn isolate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Strict parse: the reply must be a JSON object with a non-empty summary.
pub fn try_parse_reply(raw: &str) -> Result<StructuredReply, ParseFailure> {
    let body = strip_code_fence(raw);
    let object = isolate_json_object(body).ok_or(ParseFailure::NoJsonObject)?;

    let mut value: Value =
        serde_json::from_str(object).map_err(|e| ParseFailure::InvalidJson(e.to_string()))?;
    let Some(map) = value.as_object_mut() else {
        return Err(ParseFailure::NoJsonObject);
    };

    let summary = match map.remove("summary") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Err(ParseFailure::MissingSummary),
    };
    let cards = normalize_cards(map.remove("cards"));

    Ok(StructuredReply { summary, cards })
}

/// Pull only the summary string out of text that failed to parse.
fn salvage_summary(raw: &str) -> Option<String> {
    let pattern = SUMMARY_PATTERN.as_ref()?;
    let captured = pattern.captures(raw)?.get(1)?.as_str();

    // Re-read the capture as a JSON string literal so escapes are decoded.
    let summary = serde_json::from_str::<String>(&format!("\"{captured}\""))
        .unwrap_or_else(|_| captured.to_string());
    let summary = summary.trim();
    (!summary.is_empty()).then(|| summary.to_string())
}

/// Parse a raw model reply, repairing or defaulting as needed.
pub fn parse_reply(raw: &str, language: Language) -> ParsedReply {
    let failure = match try_parse_reply(raw) {
        Ok(reply) => {
            return ParsedReply {
                reply,
                outcome: ParseOutcome::Exact,
            };
        }
        Err(failure) => failure,
    };

    if let Some(summary) = salvage_summary(raw) {
        warn!(error = %failure, "Recovered summary from malformed reply");
        return ParsedReply {
            reply: StructuredReply::text(summary),
            outcome: ParseOutcome::SummaryOnly,
        };
    }

    warn!(error = %failure, language = %language, "Reply unusable, substituting apology");
    debug!(raw = %raw, "Unparseable reply");
    ParsedReply {
        reply: StructuredReply::apology(language),
        outcome: ParseOutcome::Fallback,
    }
}
