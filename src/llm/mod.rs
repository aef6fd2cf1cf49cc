//! LLM integration for the batch classifier.
//!
//! Supports:
//! - **Anthropic**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! Uses the rig-core crate for HTTP transport and the `RigAdapter` to bridge
//! rig's `CompletionModel` trait to our `LlmProvider` trait.

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::ConfigError;

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: secrecy::SecretString,
    pub model: String,
}

impl LlmConfig {
    /// Build from environment. Prefers Anthropic, falls back to OpenAI.
    ///
    /// Fails fast with `ConfigError` if no API credential is configured —
    /// the classifier is unusable without one.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
            return Ok(Self {
                backend: LlmBackend::Anthropic,
                api_key: secrecy::SecretString::from(key),
                model: std::env::var("TRIAGE_MODEL")
                    .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
            });
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            return Ok(Self {
                backend: LlmBackend::OpenAi,
                api_key: secrecy::SecretString::from(key),
                model: std::env::var("TRIAGE_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            });
        }
        Err(ConfigError::MissingEnvVar(
            "ANTHROPIC_API_KEY or OPENAI_API_KEY".to_string(),
        ))
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    match config.backend {
        LlmBackend::Anthropic => create_anthropic_provider(config),
        LlmBackend::OpenAi => create_openai_provider(config),
    }
}

fn create_anthropic_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret()).map_err(|e| {
            ConfigError::InvalidValue {
                key: "ANTHROPIC_API_KEY".to_string(),
                message: format!("Failed to create Anthropic client: {e}"),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using Anthropic (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}

fn create_openai_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, ConfigError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            ConfigError::InvalidValue {
                key: "OPENAI_API_KEY".to_string(),
                message: format!("Failed to create OpenAI client: {e}"),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}
