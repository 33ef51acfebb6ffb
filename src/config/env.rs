//! Environment variable loading.
//!
//! Every value is optional here; defaults are applied in `merge`.

use std::env;
use std::str::FromStr;

use super::ConfigError;
use crate::core::language::Language;

/// Raw values read from the environment.
#[derive(Debug, Default)]
pub(super) struct EnvValues {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub chat_model: Option<String>,
    pub follow_up_model: Option<String>,
    pub realtime_model: Option<String>,
    pub realtime_voice: Option<String>,
    pub festival_data_path: Option<String>,
    pub default_language: Option<Language>,
    pub llm_timeout_seconds: Option<u64>,
    pub cors_allowed_origins: Option<String>,
    pub rate_limit_requests_per_second: Option<u32>,
    pub rate_limit_burst_size: Option<u32>,
}

/// Trimmed, non-empty value of `key`.
fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|value| {
            value.parse::<T>().map_err(|e| ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

pub(super) fn parse_language(key: &'static str, value: &str) -> Result<Language, ConfigError> {
    value.parse::<Language>().map_err(|e| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

pub(super) fn read_env() -> Result<EnvValues, ConfigError> {
    let default_language = env_string("DEFAULT_LANGUAGE")
        .map(|value| parse_language("DEFAULT_LANGUAGE", &value))
        .transpose()?;

    Ok(EnvValues {
        host: env_string("HOST"),
        port: env_parse("PORT")?,
        tls_cert_path: env_string("TLS_CERT_PATH"),
        tls_key_path: env_string("TLS_KEY_PATH"),
        openai_api_key: env_string("OPENAI_API_KEY"),
        openai_base_url: env_string("OPENAI_BASE_URL"),
        chat_model: env_string("CHAT_MODEL"),
        follow_up_model: env_string("FOLLOW_UP_MODEL"),
        realtime_model: env_string("REALTIME_MODEL"),
        realtime_voice: env_string("REALTIME_VOICE"),
        festival_data_path: env_string("FESTIVAL_DATA_PATH"),
        default_language,
        llm_timeout_seconds: env_parse("LLM_TIMEOUT_SECONDS")?,
        cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
        rate_limit_requests_per_second: env_parse("RATE_LIMIT_REQUESTS_PER_SECOND")?,
        rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE")?,
    })
}
