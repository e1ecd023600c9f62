//! Error types for the generation pipeline.
//!
//! Failures are plain values. Recoverable ones (`Parse`, `Validation`,
//! `Provider`, `Timeout`) feed the retry loop; `Configuration` and
//! `Generation` are terminal.

use std::time::Duration;

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Unified error type for lesson generation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Invalid or missing startup configuration (no usable credentials,
    /// unknown provider name). Raised at construction, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The provider returned an HTTP- or API-level failure.
    #[error("{provider} API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    /// An LLM call exceeded the configured deadline.
    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    /// Model output did not decode into the expected slide schema.
    #[error("parse error: {0}")]
    Parse(String),

    /// A decoded deck violated the presentation structure rules.
    #[error("validation error: {0}")]
    Validation(String),

    /// All attempts failed. Carries the last underlying cause.
    #[error("generation failed after {attempts} attempt(s): {source}")]
    Generation {
        attempts: u32,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a provider error without an HTTP status.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Wrap the last failure of an exhausted attempt budget.
    pub fn exhausted(attempts: u32, source: EngineError) -> Self {
        Self::Generation {
            attempts,
            source: Box::new(source),
        }
    }

    /// Whether another attempt with the same prompt could succeed.
    ///
    /// LLM output is non-deterministic, so schema mismatches are retryable
    /// alongside transport-level failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. } | Self::Timeout(_) | Self::Parse(_) | Self::Validation(_)
        )
    }

    /// The last underlying cause of a terminal `Generation` error, or the
    /// error itself for everything else.
    pub fn root_cause(&self) -> &EngineError {
        match self {
            Self::Generation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

/// Classify a non-success provider response.
///
/// Both OpenAI and Gemini wrap failures in an `{"error": {...}}` envelope
/// with a `message` field. When the envelope is absent the raw body is kept,
/// truncated so multi-kilobyte HTML error pages don't flood logs.
pub(crate) fn classify_http_error(provider: &str, status: u16, body: &str) -> EngineError {
    let message = envelope_message(body).unwrap_or_else(|| truncate(body.trim(), 200));

    EngineError::Provider {
        provider: provider.to_string(),
        status: Some(status),
        message,
    }
}

fn envelope_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let error_obj = json.get("error")?;

    error_obj
        .get("message")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
