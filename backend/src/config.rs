//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `8080` |
//! | `SEED_ON_STARTUP` | `true` |
//! | `HTTP_TIMEOUT_SECS` | `10` |
//! | `AUTH_MODE` | `identity-toolkit` if `IDENTITY_API_KEY` is set, else `static` |
//! | `IDENTITY_API_KEY`, `IDENTITY_ENDPOINT` | none, Identity Toolkit endpoint |
//! | `ADMIN_TOKENS` | empty (`token=uid[:email],...`) |
//! | `ASSISTANT_API_KEY`, `ASSISTANT_MODEL`, `ASSISTANT_ENDPOINT` | none, `gemini-3-flash-preview`, Gemini endpoint |
//!
//! Store selection is handled separately by [`crate::db::RepositoryFactory`].

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    identity_toolkit, IdentityToolkitConfig, IdentityToolkitVerifier, StaticTokenVerifier,
    TokenSpecError, TokenVerifier,
};
use crate::services::assistant::{self, AssistantConfig, GeminiAssistant};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error(transparent)]
    Tokens(#[from] TokenSpecError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    IdentityToolkit,
    Static,
}

impl FromStr for AuthMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "identity-toolkit" | "identity_toolkit" | "firebase" => Ok(AuthMode::IdentityToolkit),
            "static" => Ok(AuthMode::Static),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AuthConfig {
    IdentityToolkit(IdentityToolkitConfig),
    /// Raw `ADMIN_TOKENS` list, already validated.
    Static(String),
}

impl AuthConfig {
    pub fn mode(&self) -> AuthMode {
        match self {
            AuthConfig::IdentityToolkit(_) => AuthMode::IdentityToolkit,
            AuthConfig::Static(_) => AuthMode::Static,
        }
    }

    pub fn build_verifier(&self) -> Result<Arc<dyn TokenVerifier>, ConfigError> {
        match self {
            AuthConfig::IdentityToolkit(config) => {
                let verifier = IdentityToolkitVerifier::new(config.clone())
                    .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
                Ok(Arc::new(verifier))
            }
            AuthConfig::Static(spec) => Ok(Arc::new(StaticTokenVerifier::parse(spec)?)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub seed_on_startup: bool,
    pub http_timeout: Duration,
    pub auth: AuthConfig,
    pub assistant: AssistantConfig,
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

fn parse_bool(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { key, value: v }),
        },
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let http_timeout = Duration::from_secs(parse_var(&lookup, "HTTP_TIMEOUT_SECS", 10u64)?);

        let identity_key = non_blank(&lookup, "IDENTITY_API_KEY");
        let mode = match non_blank(&lookup, "AUTH_MODE") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "AUTH_MODE",
                value: raw,
            })?,
            None if identity_key.is_some() => AuthMode::IdentityToolkit,
            None => AuthMode::Static,
        };

        let auth = match mode {
            AuthMode::IdentityToolkit => {
                let api_key = identity_key.ok_or(ConfigError::Missing("IDENTITY_API_KEY"))?;
                AuthConfig::IdentityToolkit(IdentityToolkitConfig {
                    api_key,
                    endpoint: non_blank(&lookup, "IDENTITY_ENDPOINT")
                        .unwrap_or_else(|| identity_toolkit::DEFAULT_ENDPOINT.to_string()),
                    timeout: http_timeout,
                })
            }
            AuthMode::Static => {
                let spec = lookup("ADMIN_TOKENS").unwrap_or_default();
                StaticTokenVerifier::parse(&spec)?;
                AuthConfig::Static(spec)
            }
        };

        let assistant = AssistantConfig {
            api_key: non_blank(&lookup, "ASSISTANT_API_KEY"),
            model: non_blank(&lookup, "ASSISTANT_MODEL")
                .unwrap_or_else(|| assistant::DEFAULT_MODEL.to_string()),
            endpoint: non_blank(&lookup, "ASSISTANT_ENDPOINT")
                .unwrap_or_else(|| assistant::DEFAULT_ENDPOINT.to_string()),
            timeout: http_timeout,
        };

        Ok(Self {
            host: non_blank(&lookup, "HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT", 8080u16)?,
            seed_on_startup: parse_bool(&lookup, "SEED_ON_STARTUP", true)?,
            http_timeout,
            auth,
            assistant,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn build_assistant(&self) -> Result<GeminiAssistant, ConfigError> {
        GeminiAssistant::new(self.assistant.clone())
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.seed_on_startup);
        assert_eq!(config.auth.mode(), AuthMode::Static);
        assert_eq!(config.assistant.model, "gemini-3-flash-preview");
        assert!(config.assistant.api_key.is_none());
    }

    #[test]
    fn test_identity_key_selects_identity_toolkit() {
        let config = config(&[("IDENTITY_API_KEY", "abc"), ("HTTP_TIMEOUT_SECS", "3")]).unwrap();
        match config.auth {
            AuthConfig::IdentityToolkit(ref it) => {
                assert_eq!(it.api_key, "abc");
                assert_eq!(it.timeout, Duration::from_secs(3));
            }
            ref other => panic!("unexpected auth config {:?}", other),
        }
    }

    #[test]
    fn test_identity_mode_requires_key() {
        assert!(matches!(
            config(&[("AUTH_MODE", "identity-toolkit")]),
            Err(ConfigError::Missing("IDENTITY_API_KEY"))
        ));
    }

    #[test]
    fn test_invalid_values_are_reported() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { key: "PORT", .. })
        ));
        assert!(matches!(
            config(&[("SEED_ON_STARTUP", "maybe")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config(&[("ADMIN_TOKENS", "broken")]),
            Err(ConfigError::Tokens(_))
        ));
    }

    #[test]
    fn test_seeding_can_be_disabled() {
        assert!(!config(&[("SEED_ON_STARTUP", "false")]).unwrap().seed_on_startup);
    }
}
