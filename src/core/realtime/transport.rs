//! HTTP implementations of the bridge's network collaborators.
//!
//! - `HttpCredentialSource` calls this gateway's `/session/{lang}` endpoint.
//! - `HttpSdpExchange` posts the local offer to the provider and returns the answer.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::base::{
    CredentialSource, RealtimeError, RealtimeResult, SdpExchange, SessionCredential,
};
use super::config::{OPENAI_REALTIME_URL, RealtimeModel};
use crate::core::language::Language;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

fn build_client() -> RealtimeResult<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| RealtimeError::InvalidConfiguration(format!("Failed to create HTTP client: {e}")))
}

// =============================================================================
// Credential Source
// =============================================================================

/// Fetches per-language credentials from a gateway base URL.
#[derive(Debug, Clone)]
pub struct HttpCredentialSource {
    client: Client,
    base_url: String,
}

impl HttpCredentialSource {
    /// Create a source for the gateway at `base_url` (e.g. `http://localhost:3001`).
    pub fn new(base_url: impl Into<String>) -> RealtimeResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RealtimeError::InvalidConfiguration(
                "Credential base URL cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            client: build_client()?,
            base_url,
        })
    }

    fn session_url(&self, language: Language) -> String {
        format!("{}/session/{}", self.base_url, language.as_str())
    }
}

#[async_trait]
impl CredentialSource for HttpCredentialSource {
    async fn fetch(&self, language: Language) -> RealtimeResult<SessionCredential> {
        let url = self.session_url(language);
        debug!(url = %url, "Fetching realtime credential");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RealtimeError::CredentialFailed(format!("Request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RealtimeError::CredentialFailed(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(RealtimeError::CredentialFailed(format!(
                "Credential endpoint returned {}: {}",
                status, body
            )));
        }

        let credential: SessionCredential = serde_json::from_str(&body).map_err(|e| {
            RealtimeError::CredentialFailed(format!("Invalid credential response: {e}"))
        })?;

        if credential.token().is_none() {
            return Err(RealtimeError::MissingCredential(
                "No ephemeral key received from server".to_string(),
            ));
        }

        Ok(credential)
    }
}

// =============================================================================
// SDP Exchange
// =============================================================================

/// Posts SDP offers to the provider's realtime endpoint.
#[derive(Debug, Clone)]
pub struct HttpSdpExchange {
    client: Client,
    endpoint: String,
    model: RealtimeModel,
}

impl HttpSdpExchange {
    /// Exchange against the public OpenAI endpoint.
    pub fn new(model: RealtimeModel) -> RealtimeResult<Self> {
        Self::with_endpoint(OPENAI_REALTIME_URL, model)
    }

    /// Exchange against a custom endpoint (used for proxies and tests).
    pub fn with_endpoint(endpoint: impl Into<String>, model: RealtimeModel) -> RealtimeResult<Self> {
        Ok(Self {
            client: build_client()?,
            endpoint: endpoint.into(),
            model,
        })
    }

    fn exchange_url(&self) -> RealtimeResult<url::Url> {
        url::Url::parse_with_params(&self.endpoint, &[("model", self.model.as_str())])
            .map_err(|e| RealtimeError::InvalidConfiguration(format!("Invalid realtime URL: {e}")))
    }
}

#[async_trait]
impl SdpExchange for HttpSdpExchange {
    async fn exchange(&self, offer_sdp: &str, token: &str) -> RealtimeResult<String> {
        let url = self.exchange_url()?;

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Content-Type", "application/sdp")
            .body(offer_sdp.to_string())
            .send()
            .await
            .map_err(|e| RealtimeError::NegotiationFailed {
                status: 0,
                message: format!("Request failed: {e}"),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RealtimeError::NegotiationFailed {
                status: status.as_u16(),
                message: format!("Failed to read response: {e}"),
            })?;

        if !status.is_success() {
            return Err(RealtimeError::NegotiationFailed {
                status: status.as_u16(),
                message: body,
            });
        }

        if body.trim().is_empty() {
            return Err(RealtimeError::NegotiationFailed {
                status: status.as_u16(),
                message: "Empty answer SDP".to_string(),
            });
        }

        Ok(body)
    }
}
