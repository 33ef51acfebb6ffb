//! Configuration validation logic.

use std::path::PathBuf;

use super::{ConfigError, ServerConfig, TlsConfig};

/// TLS paths must be set together; neither set disables TLS.
pub(super) fn resolve_tls(
    cert_path: Option<String>,
    key_path: Option<String>,
) -> Result<Option<TlsConfig>, ConfigError> {
    match (cert_path, key_path) {
        (Some(cert), Some(key)) => Ok(Some(TlsConfig {
            cert_path: PathBuf::from(cert),
            key_path: PathBuf::from(key),
        })),
        (None, None) => Ok(None),
        (Some(_), None) => Err(ConfigError::Validation(
            "TLS_CERT_PATH is set but TLS_KEY_PATH is missing".to_string(),
        )),
        (None, Some(_)) => Err(ConfigError::Validation(
            "TLS_KEY_PATH is set but TLS_CERT_PATH is missing".to_string(),
        )),
    }
}

/// Checks that apply to the merged configuration.
pub(super) fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    if config.llm_timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "LLM_TIMEOUT_SECONDS must be greater than zero".to_string(),
        ));
    }
    if config.rate_limit_requests_per_second == 0 || config.rate_limit_burst_size == 0 {
        return Err(ConfigError::Validation(
            "Rate limit and burst size must be greater than zero".to_string(),
        ));
    }
    if url::Url::parse(&config.openai_base_url).is_err() {
        return Err(ConfigError::InvalidValue {
            key: "OPENAI_BASE_URL",
            value: config.openai_base_url.clone(),
            reason: "not an absolute URL".to_string(),
        });
    }
    for (key, value) in [
        ("CHAT_MODEL", &config.chat_model),
        ("FOLLOW_UP_MODEL", &config.follow_up_model),
        ("REALTIME_MODEL", &config.realtime_model),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tls_pairs() {
        assert_eq!(resolve_tls(None, None).unwrap(), None);
        let tls = resolve_tls(Some("c.pem".into()), Some("k.pem".into()))
            .unwrap()
            .unwrap();
        assert_eq!(tls.cert_path, PathBuf::from("c.pem"));
        assert!(resolve_tls(Some("c.pem".into()), None).is_err());
        assert!(resolve_tls(None, Some("k.pem".into())).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = ServerConfig::default();
        assert!(validate(&config).is_ok());
        config.llm_timeout_seconds = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = ServerConfig::default();
        config.openai_base_url = "not a url".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("OPENAI_BASE_URL"));
    }
}
