//! Resolves the configured provider name to a shared backend.

use std::sync::Arc;

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// Names accepted for the bundled `OpenAI`-compatible backend.
///
/// Self-hosted servers speak the same wire protocol and only differ in
/// their base URL.
const OPENAI_COMPATIBLE: &[&str] = &["openai", "openai-compatible", "vllm", "ollama"];

/// Builds the backend named by `config.provider`.
///
/// One provider is shared by every predictor a seeker builds, so it comes
/// back behind an [`Arc`].
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown names, and for
/// `OpenAI`-compatible names when the `openai` feature is disabled.
pub fn create_provider(config: &AgentConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    let name = config.provider.to_ascii_lowercase();
    if OPENAI_COMPATIBLE.contains(&name.as_str()) {
        #[cfg(feature = "openai")]
        return Ok(Arc::new(crate::agent::providers::OpenAiProvider::new(
            config,
        )));
    }
    Err(AgentError::UnsupportedProvider {
        name: config.provider.clone(),
    })
}
