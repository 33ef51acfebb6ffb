use serde::Deserialize;
use std::path::Path;

use super::ConfigError;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 3001
///   tls:
///     cert_path: "/etc/concierge/cert.pem"
///     key_path: "/etc/concierge/key.pem"
///
/// openai:
///   api_key: "sk-..."
///   base_url: "https://api.openai.com"
///   chat_model: "gpt-4o-mini"
///   follow_up_model: "gpt-4o-mini"
///   realtime_model: "gpt-4o-realtime-preview-2024-12-17"
///   realtime_voice: "alloy"
///   timeout_seconds: 60
///
/// festival:
///   data_path: "data/festival.json"
///   default_language: "ko"
///
/// security:
///   cors_allowed_origins: "https://festival.example.com"
///   rate_limit_requests_per_second: 60
///   rate_limit_burst_size: 10
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub openai: Option<OpenAIYaml>,
    pub festival: Option<FestivalYaml>,
    pub security: Option<SecurityYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// OpenAI settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OpenAIYaml {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub chat_model: Option<String>,
    pub follow_up_model: Option<String>,
    pub realtime_model: Option<String>,
    pub realtime_voice: Option<String>,
    /// Upstream request timeout in seconds
    pub timeout_seconds: Option<u64>,
}

/// Festival data settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FestivalYaml {
    /// Path of the facts JSON file
    pub data_path: Option<String>,
    /// One of ko, en, ja, zh
    pub default_language: Option<String>,
}

/// Security configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SecurityYaml {
    /// CORS allowed origins (comma-separated list or "*" for all)
    pub cors_allowed_origins: Option<String>,
    /// Maximum requests per second per IP address
    pub rate_limit_requests_per_second: Option<u32>,
    /// Maximum burst size for rate limiting
    pub rate_limit_burst_size: Option<u32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Required fields have invalid types
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from YAML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to null, which means "no overrides"
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_yaml_config_full() {
        let yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
  tls:
    cert_path: "/tmp/cert.pem"
    key_path: "/tmp/key.pem"

openai:
  api_key: "sk-test"
  base_url: "http://localhost:9999"
  chat_model: "gpt-4o"
  realtime_voice: "verse"
  timeout_seconds: 30

festival:
  data_path: "/srv/festival.json"
  default_language: "zh"

security:
  cors_allowed_origins: "*"
  rate_limit_requests_per_second: 100
"#;

        let config = YamlConfig::parse(yaml).unwrap();
        let server = config.server.unwrap();
        assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(server.port, Some(8080));
        assert_eq!(
            server.tls.unwrap().cert_path.as_deref(),
            Some("/tmp/cert.pem")
        );

        let openai = config.openai.unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(openai.chat_model.as_deref(), Some("gpt-4o"));
        assert_eq!(openai.follow_up_model, None);
        assert_eq!(openai.timeout_seconds, Some(30));

        let festival = config.festival.unwrap();
        assert_eq!(festival.default_language.as_deref(), Some("zh"));

        let security = config.security.unwrap();
        assert_eq!(security.rate_limit_requests_per_second, Some(100));
        assert_eq!(security.rate_limit_burst_size, None);
    }

    #[test]
    fn test_yaml_config_partial() {
        let config = YamlConfig::parse("server:\n  port: 9000\n").unwrap();
        assert_eq!(config.server.unwrap().port, Some(9000));
        assert!(config.openai.is_none());
        assert!(config.festival.is_none());
    }

    #[test]
    fn test_yaml_config_empty() {
        let config = YamlConfig::parse("").unwrap();
        assert!(config.server.is_none());
        assert!(config.security.is_none());
    }

    #[test]
    fn test_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "openai:\n  api_key: \"sk-file\"\n").unwrap();

        let config = YamlConfig::from_file(&path).unwrap();
        assert_eq!(config.openai.unwrap().api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn test_from_file_not_found() {
        let err = YamlConfig::from_file(Path::new("/nonexistent/config.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_from_file_invalid_yaml() {
        let err = YamlConfig::parse("server: [unclosed").unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }
}
