//! Realtime bridge configuration.
//!
//! This module contains:
//! - Provider endpoints
//! - Model selection
//! - Voice selection
//! - Negotiation timing (ICE gathering bound, greeting delay)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI Realtime WebRTC offer/answer endpoint.
pub const OPENAI_REALTIME_URL: &str = "https://api.openai.com/v1/realtime";

/// Path of the ephemeral session endpoint, relative to the API base URL.
pub const OPENAI_REALTIME_SESSIONS_PATH: &str = "/v1/realtime/sessions";

/// Public STUN servers used when none are configured.
pub const DEFAULT_STUN_SERVERS: [&str; 2] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
];

/// Upper bound on the wait for ICE gathering to complete.
pub const ICE_GATHERING_TIMEOUT: Duration = Duration::from_secs(2);

/// Delay between the channel opening and the greeting trigger.
pub const GREETING_DELAY: Duration = Duration::from_millis(750);

/// Label of the control data channel.
pub const CONTROL_CHANNEL_LABEL: &str = "response";

// =============================================================================
// Models
// =============================================================================

/// Supported OpenAI Realtime models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RealtimeModel {
    /// GPT-4o Realtime Preview 2024-12-17
    #[default]
    #[serde(rename = "gpt-4o-realtime-preview-2024-12-17")]
    Gpt4oRealtimePreview20241217,
    /// GPT-4o Realtime Preview
    #[serde(rename = "gpt-4o-realtime-preview")]
    Gpt4oRealtimePreview,
    /// GPT-4o Mini Realtime Preview 2024-12-17
    #[serde(rename = "gpt-4o-mini-realtime-preview-2024-12-17")]
    Gpt4oMiniRealtimePreview20241217,
}

impl RealtimeModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt4oRealtimePreview20241217 => "gpt-4o-realtime-preview-2024-12-17",
            Self::Gpt4oRealtimePreview => "gpt-4o-realtime-preview",
            Self::Gpt4oMiniRealtimePreview20241217 => "gpt-4o-mini-realtime-preview-2024-12-17",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "gpt-4o-realtime-preview-2024-12-17" => Self::Gpt4oRealtimePreview20241217,
            "gpt-4o-realtime-preview" => Self::Gpt4oRealtimePreview,
            "gpt-4o-mini-realtime-preview-2024-12-17" => Self::Gpt4oMiniRealtimePreview20241217,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for RealtimeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Voices
// =============================================================================

/// Voices available to the realtime model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeVoice {
    /// Alloy voice (default)
    #[default]
    Alloy,
    /// Ash voice
    Ash,
    /// Ballad voice
    Ballad,
    /// Coral voice
    Coral,
    /// Echo voice
    Echo,
    /// Sage voice
    Sage,
    /// Shimmer voice
    Shimmer,
    /// Verse voice
    Verse,
}

impl RealtimeVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Ash => "ash",
            Self::Ballad => "ballad",
            Self::Coral => "coral",
            Self::Echo => "echo",
            Self::Sage => "sage",
            Self::Shimmer => "shimmer",
            Self::Verse => "verse",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "alloy" => Self::Alloy,
            "ash" => Self::Ash,
            "ballad" => Self::Ballad,
            "coral" => Self::Coral,
            "echo" => Self::Echo,
            "sage" => Self::Sage,
            "shimmer" => Self::Shimmer,
            "verse" => Self::Verse,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for RealtimeVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Bridge Configuration
// =============================================================================

/// Tunables for one `RealtimeBridge`.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// STUN/TURN servers for the peer connection (at least two)
    pub ice_servers: Vec<String>,
    /// Upper bound on the ICE gathering wait
    pub ice_gathering_timeout: Duration,
    /// Delay between channel open and greeting trigger
    pub greeting_delay: Duration,
    /// Control channel label
    pub channel_label: String,
    /// Voice declared in `session.update`
    pub voice: RealtimeVoice,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            ice_servers: DEFAULT_STUN_SERVERS.iter().map(|s| s.to_string()).collect(),
            ice_gathering_timeout: ICE_GATHERING_TIMEOUT,
            greeting_delay: GREETING_DELAY,
            channel_label: CONTROL_CHANNEL_LABEL.to_string(),
            voice: RealtimeVoice::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_as_str() {
        assert_eq!(
            RealtimeModel::default().as_str(),
            "gpt-4o-realtime-preview-2024-12-17"
        );
        assert_eq!(
            RealtimeModel::from_str_or_default("GPT-4O-REALTIME-PREVIEW"),
            RealtimeModel::Gpt4oRealtimePreview
        );
        assert_eq!(
            RealtimeModel::from_str_or_default("unknown"),
            RealtimeModel::default()
        );
    }

    #[test]
    fn test_voice_parse() {
        assert_eq!(RealtimeVoice::from_str_or_default("coral"), RealtimeVoice::Coral);
        assert_eq!(RealtimeVoice::from_str_or_default("nope"), RealtimeVoice::Alloy);
        assert_eq!(RealtimeVoice::Verse.to_string(), "verse");
    }

    #[test]
    fn test_bridge_config_defaults() {
        let config = BridgeConfig::default();
        assert!(config.ice_servers.len() >= 2);
        assert_eq!(config.ice_gathering_timeout, Duration::from_secs(2));
        assert!(config.greeting_delay >= Duration::from_millis(700));
        assert!(config.greeting_delay <= Duration::from_millis(800));
        assert_eq!(config.channel_label, "response");
    }
}
