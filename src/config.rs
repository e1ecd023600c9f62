//! Runtime configuration.
//!
//! Settings are read once (from the environment or built explicitly) and
//! handed to the engine at construction. Components never consult the
//! environment themselves, so a request's behavior is fixed at startup.

use std::fmt;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{EngineError, Result};

/// Default model when the resolved provider is Google.
pub const DEFAULT_GOOGLE_MODEL: &str = "gemini-2.0-flash";
/// Default model when the resolved provider is OpenAI.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Default number of extra attempts after the first failed one.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Default preferred provider.
pub const DEFAULT_PROVIDER: &str = "google";

/// Which LLM backend serves requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Google,
}

impl ProviderKind {
    /// Lowercase provider name as used in configuration and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
        }
    }

    /// Parse a configured provider name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "google" => Some(Self::Google),
            _ => None,
        }
    }

    /// Model used when no explicit model override is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Google => DEFAULT_GOOGLE_MODEL,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application settings.
///
/// API keys are held as [`SecretString`] so they never appear in debug
/// output or logs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<SecretString>,
    pub google_api_key: Option<SecretString>,
    /// Preferred provider name (`"openai"` or `"google"`).
    pub default_provider: String,
    /// Model override for whichever provider gets resolved. `None` means
    /// the provider's own default.
    pub default_model: Option<String>,
    pub temperature: f32,
    /// Extra attempts after the first one; total attempts = `1 + max_retries`.
    pub max_retries: u32,
    /// Per-LLM-call deadline. `None` leaves calls unbounded.
    pub timeout: Option<Duration>,
    /// Deployment label surfaced by the health endpoint.
    pub environment: String,
    /// Default log filter level for the service binary.
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            google_api_key: None,
            default_provider: DEFAULT_PROVIDER.to_string(),
            default_model: None,
            temperature: DEFAULT_TEMPERATURE,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: None,
            environment: "development".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Empty values count as unset and malformed numbers fall back to the
    /// defaults, so a sloppy `.env` file cannot prevent startup.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            openai_api_key: env_nonempty("OPENAI_API_KEY").map(SecretString::from),
            google_api_key: env_nonempty("GOOGLE_API_KEY").map(SecretString::from),
            default_provider: env_nonempty("DEFAULT_LLM_PROVIDER")
                .unwrap_or(defaults.default_provider),
            default_model: env_nonempty("DEFAULT_MODEL"),
            temperature: env_parsed("DEFAULT_TEMPERATURE").unwrap_or(defaults.temperature),
            max_retries: env_parsed("DEFAULT_MAX_RETRIES").unwrap_or(defaults.max_retries),
            timeout: env_parsed::<u64>("DEFAULT_TIMEOUT").map(Duration::from_secs),
            environment: env_nonempty("ENVIRONMENT").unwrap_or(defaults.environment),
            log_level: env_nonempty("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Set the OpenAI API key.
    pub fn with_openai_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Set the Google API key.
    pub fn with_google_key(mut self, key: impl Into<String>) -> Self {
        self.google_api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Set the preferred provider name.
    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = provider.into();
        self
    }

    /// Override the model for the resolved provider.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    /// Set the retry budget (extra attempts after the first).
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Pick the provider to use for all requests.
    ///
    /// The preferred provider wins when it has a credential; otherwise any
    /// provider with a credential is used (Google first). With no
    /// credentials at all this is a fatal configuration error.
    pub fn resolve_provider(&self) -> Result<ProviderKind> {
        if let Some(kind) = ProviderKind::from_name(&self.default_provider) {
            if self.has_credential(kind) {
                return Ok(kind);
            }
        }
        if self.has_credential(ProviderKind::Google) {
            return Ok(ProviderKind::Google);
        }
        if self.has_credential(ProviderKind::OpenAi) {
            return Ok(ProviderKind::OpenAi);
        }
        Err(EngineError::configuration(
            "no LLM API key configured; set OPENAI_API_KEY or GOOGLE_API_KEY",
        ))
    }

    /// Model name for the given provider, honoring the configured override.
    pub fn model_for(&self, provider: ProviderKind) -> String {
        self.default_model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string())
    }

    /// Credential for the given provider, if configured.
    pub fn api_key_for(&self, provider: ProviderKind) -> Option<&SecretString> {
        match provider {
            ProviderKind::OpenAi => self.openai_api_key.as_ref(),
            ProviderKind::Google => self.google_api_key.as_ref(),
        }
    }

    fn has_credential(&self, provider: ProviderKind) -> bool {
        self.api_key_for(provider).is_some()
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_nonempty(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.default_provider, "google");
        assert_eq!(settings.temperature, 0.5);
        assert_eq!(settings.max_retries, 2);
        assert!(settings.timeout.is_none());
        assert!(settings.openai_api_key.is_none());
        assert!(settings.google_api_key.is_none());
        assert_eq!(settings.environment, "development");
    }

    #[test]
    fn resolves_default_provider_when_both_keys_present() {
        let settings = Settings::default()
            .with_default_provider("openai")
            .with_openai_key("openai-key")
            .with_google_key("google-key");
        assert_eq!(settings.resolve_provider().unwrap(), ProviderKind::OpenAi);

        let settings = Settings::default()
            .with_default_provider("google")
            .with_openai_key("openai-key")
            .with_google_key("google-key");
        assert_eq!(settings.resolve_provider().unwrap(), ProviderKind::Google);
    }

    #[test]
    fn falls_back_to_whichever_provider_has_a_key() {
        let settings = Settings::default().with_openai_key("openai-key");
        assert_eq!(settings.resolve_provider().unwrap(), ProviderKind::OpenAi);

        let settings = Settings::default()
            .with_default_provider("openai")
            .with_google_key("google-key");
        assert_eq!(settings.resolve_provider().unwrap(), ProviderKind::Google);
    }

    #[test]
    fn fails_without_any_credential() {
        let err = Settings::default().resolve_provider().unwrap_err();
        match err {
            EngineError::Configuration(message) => {
                assert!(message.to_lowercase().contains("api key"));
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_default_provider_falls_back() {
        let settings = Settings::default()
            .with_default_provider("anthropic")
            .with_google_key("google-key");
        assert_eq!(settings.resolve_provider().unwrap(), ProviderKind::Google);
    }

    #[test]
    fn model_selection_per_provider() {
        let settings = Settings::default();
        assert_eq!(settings.model_for(ProviderKind::Google), "gemini-2.0-flash");
        assert_eq!(settings.model_for(ProviderKind::OpenAi), "gpt-4");

        let settings = settings.with_model("gemini-2.5-pro");
        assert_eq!(settings.model_for(ProviderKind::Google), "gemini-2.5-pro");
        assert_eq!(settings.model_for(ProviderKind::OpenAi), "gemini-2.5-pro");
    }
}
