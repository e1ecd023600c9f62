//! Chat model abstraction and the bundled provider clients.
//!
//! The engine drives everything through the [`ChatModel`] trait, so tests
//! can substitute scripted fakes and new providers only need one impl.

mod gemini;
mod openai;

pub use gemini::GeminiChat;
pub use openai::OpenAiChat;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ProviderKind, Settings};
use crate::error::{EngineError, Result};

/// One fully-specified LLM call.
///
/// Every call the engine makes expects a JSON reply, so clients put their
/// provider into JSON output mode where the API supports it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System instruction framing the task.
    pub system: String,
    /// User message with the concrete ask.
    pub user: String,
    /// Sampling temperature.
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature,
        }
    }
}

/// Minimal chat interface the generation engine is written against.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the raw text reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Short provider name for logs and health reports.
    fn provider_name(&self) -> &'static str;
}

/// Build the client for `provider`, using the key and model from `settings`.
///
/// Fails with [`EngineError::Configuration`] when the matching API key is
/// missing, which can only happen when the provider was forced rather than
/// resolved through [`Settings::resolve_provider`].
pub fn build_model(settings: &Settings, provider: ProviderKind) -> Result<Arc<dyn ChatModel>> {
    let api_key = settings
        .api_key_for(provider)
        .cloned()
        .ok_or_else(|| {
            EngineError::configuration(format!("{provider} selected but its API key is not set"))
        })?;
    let model = settings.model_for(provider);

    Ok(match provider {
        ProviderKind::OpenAi => Arc::new(OpenAiChat::new(api_key, model)),
        ProviderKind::Google => Arc::new(GeminiChat::new(api_key, model)),
    })
}
