//! Configuration module for the festival concierge server
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use festival_concierge::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::core::language::Language;

mod env;
mod merge;
mod validation;
mod yaml;

pub use yaml::YamlConfig;

/// Default model for chat answers.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default model for follow-up suggestions.
pub const DEFAULT_FOLLOW_UP_MODEL: &str = "gpt-4o-mini";

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// The YAML file is malformed
    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value has the wrong format
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    /// The merged configuration is inconsistent
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// TLS configuration for HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
///
/// Contains everything needed to run the concierge server:
/// - Server settings (host, port, TLS)
/// - OpenAI credentials, endpoint and model selection
/// - Festival data source and default language
/// - Security settings (CORS, rate limiting)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    // OpenAI
    /// API key used for chat completions and realtime session minting
    pub openai_api_key: Option<String>,
    /// API base URL (overridable for proxies and tests)
    pub openai_base_url: String,
    pub chat_model: String,
    pub follow_up_model: String,
    pub realtime_model: String,
    pub realtime_voice: String,
    /// Timeout for upstream model calls
    pub llm_timeout_seconds: u64,

    // Festival
    /// JSON facts file; the bundled facts are used when unset
    pub festival_data_path: Option<PathBuf>,
    /// Language used for credential requests without a language and for degraded labels
    pub default_language: Language,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

/// Zeroize the API key when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables (after `.env` has been
    /// loaded by the binary) and validate it.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = merge::merge_config(None)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// After loading and merging, performs validation on the final configuration.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml_config = yaml::YamlConfig::from_file(path.as_ref())?;
        let config = merge::merge_config(Some(yaml_config))?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// The configured OpenAI key, empty when unset.
    pub fn openai_api_key_or_empty(&self) -> String {
        self.openai_api_key.clone().unwrap_or_default()
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_seconds)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            tls: None,
            openai_api_key: None,
            openai_base_url: crate::core::llm::OPENAI_API_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            follow_up_model: DEFAULT_FOLLOW_UP_MODEL.to_string(),
            realtime_model: crate::core::realtime::RealtimeModel::default().as_str().to_string(),
            realtime_voice: crate::core::realtime::RealtimeVoice::default().as_str().to_string(),
            llm_timeout_seconds: 60,
            festival_data_path: None,
            default_language: Language::default(),
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}
