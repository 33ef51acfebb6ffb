//! Server-side minting of short-lived realtime sessions.
//!
//! The browser never sees the long-lived API key. Instead the gateway asks the
//! provider for an ephemeral session whose instructions are already bound to
//! the festival facts and to the caller's language, and hands the provider's
//! response (including `client_secret.value`) back to the browser.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use super::base::{RealtimeError, RealtimeResult};
use super::config::{OPENAI_REALTIME_SESSIONS_PATH, RealtimeModel, RealtimeVoice};
use super::tools::{NAVIGATE_SECTION, SECTIONS};
use crate::core::festival::FestivalSummary;
use crate::core::language::Language;

/// Settings for `SessionMinter`.
#[derive(Debug, Clone)]
pub struct MintConfig {
    /// Long-lived provider API key
    pub api_key: String,
    /// Provider API base URL (e.g. `https://api.openai.com`)
    pub base_url: String,
    /// Realtime model
    pub model: RealtimeModel,
    /// Voice
    pub voice: RealtimeVoice,
    /// HTTP timeout
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
    model: &'a str,
    voice: &'a str,
    modalities: [&'static str; 2],
    instructions: String,
}

/// Mints ephemeral realtime sessions at the provider.
#[derive(Debug, Clone)]
pub struct SessionMinter {
    client: Client,
    config: MintConfig,
}

impl SessionMinter {
    pub fn new(config: MintConfig) -> RealtimeResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                RealtimeError::InvalidConfiguration(format!("Failed to create HTTP client: {e}"))
            })?;
        Ok(Self { client, config })
    }

    fn sessions_url(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            OPENAI_REALTIME_SESSIONS_PATH
        )
    }

    /// Request a new session for `language`.
    ///
    /// Returns the provider's JSON body on success. A non-2xx answer is
    /// returned as `RealtimeError::ProviderError` carrying status and body so
    /// the HTTP layer can pass both through.
    pub async fn mint(&self, facts: &FestivalSummary, language: Language) -> RealtimeResult<Value> {
        if self.config.api_key.trim().is_empty() {
            return Err(RealtimeError::MissingCredential(
                "OPENAI_API_KEY is not configured".to_string(),
            ));
        }

        let request = SessionRequest {
            model: self.config.model.as_str(),
            voice: self.config.voice.as_str(),
            modalities: ["audio", "text"],
            instructions: build_instructions(facts, language),
        };

        debug!(language = %language, model = %self.config.model, "Minting realtime session");

        let response = self
            .client
            .post(self.sessions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| RealtimeError::CredentialFailed(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RealtimeError::CredentialFailed(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            error!(status = %status, "OpenAI session error: {}", body);
            return Err(RealtimeError::ProviderError {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)?;
        info!(language = %language, "Realtime session minted");
        Ok(value)
    }
}

fn join_or_unknown(parts: &[String]) -> String {
    if parts.is_empty() {
        "not announced".to_string()
    } else {
        parts.join(", ")
    }
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "not announced"
    } else {
        value
    }
}

/// System instructions for one voice session.
///
/// The prompt binds the festival facts, names the navigation capability with
/// its section domain, and pins the spoken language and the opening line.
pub fn build_instructions(facts: &FestivalSummary, language: Language) -> String {
    let restaurants = facts
        .restaurants
        .iter()
        .map(|r| format!("{} ({}) at {}", r.name, r.kind, r.address))
        .collect::<Vec<_>>();

    format!(
        "You are the official AI concierge of '{name}'.\n\
         Answer callers' questions about the festival in a bright, natural voice, clearly and warmly.\n\
         \n\
         The festival runs {period} at {location}.\n\
         Organizers: {organizers}. Contact: {contact}. Admission: {price}.\n\
         Main programs: {programs}.\n\
         Transport: {transport}.\n\
         Lost and found: {lost}.\n\
         Restaurants: {restaurants}.\n\
         Do not invent times, prices or places that are not listed above.\n\
         \n\
         You can call {tool}({{ \"section\": \"...\" }}) to show one of these page sections: {sections}.\n\
         \n\
         Speak only {lang_name}.\n\
         When the call connects, greet the caller exactly once in {lang_name}, for example: \"{greeting}\". \
         Then stop and wait for the caller's question.",
        name = or_unknown(&facts.name),
        period = or_unknown(&facts.period),
        location = or_unknown(&facts.location),
        organizers = or_unknown(&facts.organizers),
        contact = or_unknown(&facts.contact),
        price = or_unknown(&facts.price),
        programs = join_or_unknown(&facts.programs),
        transport = or_unknown(&facts.transport),
        lost = or_unknown(&facts.lost_and_found),
        restaurants = join_or_unknown(&restaurants),
        tool = NAVIGATE_SECTION,
        sections = SECTIONS.join(", "),
        lang_name = language.english_name(),
        greeting = language.greeting(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::festival::RestaurantFact;

    fn summary() -> FestivalSummary {
        FestivalSummary {
            name: "Gaetgol Festival".to_string(),
            period: "Sep 26 - Sep 28".to_string(),
            programs: vec!["Busking".to_string(), "Yoga".to_string()],
            restaurants: vec![RestaurantFact {
                name: "Noodle House".to_string(),
                kind: "Korean".to_string(),
                address: "Zone B".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_instructions_bind_facts_and_language() {
        let text = build_instructions(&summary(), Language::Ja);
        assert!(text.contains("Gaetgol Festival"));
        assert!(text.contains("Busking, Yoga"));
        assert!(text.contains("Noodle House (Korean) at Zone B"));
        assert!(text.contains("navigateSection"));
        assert!(text.contains("announcements"));
        assert!(text.contains("Speak only Japanese"));
        assert!(text.contains(Language::Ja.greeting()));
        assert!(text.contains("not announced"));
    }

    #[test]
    fn test_sessions_url() {
        let minter = SessionMinter::new(MintConfig {
            api_key: "sk-test".to_string(),
            base_url: "http://localhost:9999/".to_string(),
            model: RealtimeModel::default(),
            voice: RealtimeVoice::default(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(minter.sessions_url(), "http://localhost:9999/v1/realtime/sessions");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let minter = SessionMinter::new(MintConfig {
            api_key: String::new(),
            base_url: "http://127.0.0.1:1".to_string(),
            model: RealtimeModel::default(),
            voice: RealtimeVoice::default(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();
        let err = minter.mint(&summary(), Language::Ko).await.unwrap_err();
        assert!(matches!(err, RealtimeError::MissingCredential(_)));
    }
}
