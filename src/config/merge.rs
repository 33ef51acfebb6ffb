//! Merging of defaults, environment and YAML values.

use std::path::PathBuf;

use super::env::{parse_language, read_env};
use super::validation::resolve_tls;
use super::yaml::YamlConfig;
use super::{ConfigError, ServerConfig};

/// Build a configuration from defaults, then environment, then YAML.
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, ConfigError> {
    let env = read_env()?;
    let yaml = yaml.unwrap_or_default();
    let server = yaml.server.unwrap_or_default();
    let tls = server.tls.unwrap_or_default();
    let openai = yaml.openai.unwrap_or_default();
    let festival = yaml.festival.unwrap_or_default();
    let security = yaml.security.unwrap_or_default();

    let mut config = ServerConfig::default();

    if let Some(host) = server.host.or(env.host) {
        config.host = host;
    }
    if let Some(port) = server.port.or(env.port) {
        config.port = port;
    }
    config.tls = resolve_tls(
        tls.cert_path.or(env.tls_cert_path),
        tls.key_path.or(env.tls_key_path),
    )?;

    config.openai_api_key = openai
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or(env.openai_api_key);
    if let Some(base_url) = openai.base_url.or(env.openai_base_url) {
        config.openai_base_url = base_url;
    }
    if let Some(model) = openai.chat_model.or(env.chat_model) {
        config.chat_model = model;
    }
    if let Some(model) = openai.follow_up_model.or(env.follow_up_model) {
        config.follow_up_model = model;
    }
    if let Some(model) = openai.realtime_model.or(env.realtime_model) {
        config.realtime_model = model;
    }
    if let Some(voice) = openai.realtime_voice.or(env.realtime_voice) {
        config.realtime_voice = voice;
    }
    if let Some(timeout) = openai.timeout_seconds.or(env.llm_timeout_seconds) {
        config.llm_timeout_seconds = timeout;
    }

    config.festival_data_path = festival
        .data_path
        .or(env.festival_data_path)
        .map(PathBuf::from);
    let yaml_language = festival
        .default_language
        .map(|value| parse_language("DEFAULT_LANGUAGE", &value))
        .transpose()?;
    if let Some(language) = yaml_language.or(env.default_language) {
        config.default_language = language;
    }

    config.cors_allowed_origins = security.cors_allowed_origins.or(env.cors_allowed_origins);
    if let Some(rps) = security
        .rate_limit_requests_per_second
        .or(env.rate_limit_requests_per_second)
    {
        config.rate_limit_requests_per_second = rps;
    }
    if let Some(burst) = security.rate_limit_burst_size.or(env.rate_limit_burst_size) {
        config.rate_limit_burst_size = burst;
    }

    Ok(config)
}
