//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;

use crate::error::{AgentError, Error, Result};

/// Default number of oracle round-trips per call.
pub const DEFAULT_BUDGET: usize = 5;
/// Default model for the stopping, query, and answer agents.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default model for the oracle.
const DEFAULT_ORACLE_MODEL: &str = "gpt-4o-mini";
/// Default max tokens per agent completion.
const DEFAULT_MAX_TOKENS: u32 = 2048;
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Configuration for the LLM-backed agents.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model for the stopping, query, and answer agents.
    pub model: String,
    /// Model for the oracle.
    pub oracle_model: String,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum oracle round-trips per call.
    pub budget: usize,
    /// Directory containing instruction override files.
    ///
    /// When set, agents load their instructions from markdown files in this
    /// directory, falling back to the derived default for any missing file.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found, or a
    /// configuration error for a negative budget.
    pub fn from_env() -> Result<Self> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    oracle_model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    budget: Option<i64>,
    budget_raw: Option<String>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("SEEKER_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("SEEKER_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("SEEKER_BASE_URL"))
                .ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("SEEKER_MODEL").ok();
        }
        if self.oracle_model.is_none() {
            self.oracle_model = std::env::var("SEEKER_ORACLE_MODEL").ok();
        }
        if self.budget.is_none() && self.budget_raw.is_none() {
            self.budget_raw = std::env::var("SEEKER_BUDGET").ok();
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("SEEKER_PROMPT_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model for the stopping, query, and answer agents.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the oracle model.
    #[must_use]
    pub fn oracle_model(mut self, model: impl Into<String>) -> Self {
        self.oracle_model = Some(model.into());
        self
    }

    /// Sets the max tokens per completion.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the oracle budget. Negative values are rejected by [`Self::build`].
    #[must_use]
    pub const fn budget(mut self, n: i64) -> Self {
        self.budget = Some(n);
        self
    }

    /// Sets the instruction override directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set, or
    /// [`Error::Configuration`] if the budget is negative or not a number.
    pub fn build(self) -> Result<AgentConfig> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        let budget = match (self.budget, self.budget_raw) {
            (Some(n), _) => validate_budget(n)?,
            (None, Some(raw)) => {
                let n = raw.trim().parse::<i64>().map_err(|_| {
                    Error::configuration(format!("SEEKER_BUDGET must be an integer, got `{raw}`"))
                })?;
                validate_budget(n)?
            }
            (None, None) => DEFAULT_BUDGET,
        };

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            oracle_model: self
                .oracle_model
                .unwrap_or_else(|| DEFAULT_ORACLE_MODEL.to_string()),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            budget,
            prompt_dir: self.prompt_dir,
        })
    }
}

/// Converts a signed budget into a loop bound.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for negative values.
pub fn validate_budget(budget: i64) -> Result<usize> {
    usize::try_from(budget)
        .map_err(|_| Error::configuration(format!("budget must be >= 0, got {budget}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.budget, DEFAULT_BUDGET);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = AgentConfig::builder().build();
        assert!(matches!(
            result,
            Err(Error::Agent(AgentError::ApiKeyMissing))
        ));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .api_key("key")
            .provider("custom")
            .model("gemma-3-12b-it")
            .oracle_model("gpt-4o")
            .budget(0)
            .temperature(0.0)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "custom");
        assert_eq!(config.model, "gemma-3-12b-it");
        assert_eq!(config.oracle_model, "gpt-4o");
        assert_eq!(config.budget, 0);
    }

    #[test]
    fn test_negative_budget_rejected() {
        let result = AgentConfig::builder().api_key("key").budget(-1).build();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_unparseable_budget_rejected() {
        let builder = AgentConfigBuilder {
            api_key: Some("key".to_string()),
            budget_raw: Some("five".to_string()),
            ..AgentConfigBuilder::default()
        };
        assert!(matches!(builder.build(), Err(Error::Configuration { .. })));
    }
}
