//! LLM-backed reasoning predictor.
//!
//! A [`Predictor`] is the default [`Agent`] implementation: it renders its
//! contract into a chain-of-thought prompt, asks the provider for a JSON
//! object, and parses the reply into a record. It performs exactly one
//! provider call per invocation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::config::AgentConfig;
use super::message::{ChatMessage, ChatRequest};
use super::prompt::{build_demo_reply, build_system_prompt, build_user_prompt, parse_completion};
use super::provider::LlmProvider;
use super::traits::{Agent, AgentRole, Demo};
use crate::error::{AgentError, Result};
use crate::record::Record;
use crate::signature::FieldContract;

/// Chain-of-thought predictor over a field contract.
///
/// Instructions and demonstrations are the tunable surface: an optimizer
/// adjusts them through [`Agent::set_instructions`] and
/// [`Agent::set_demos`] without touching the field list, including on a
/// seeker that is already built (via `agent_mut`).
#[derive(Clone)]
pub struct Predictor {
    name: String,
    contract: FieldContract,
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    demos: Vec<Demo>,
}

impl Predictor {
    /// Creates a predictor for `role` using the model settings in `config`.
    #[must_use]
    pub fn new(
        role: AgentRole,
        contract: FieldContract,
        provider: Arc<dyn LlmProvider>,
        config: &AgentConfig,
    ) -> Self {
        let model = match role {
            AgentRole::Oracle => config.oracle_model.clone(),
            _ => config.model.clone(),
        };
        Self {
            name: role.as_str().to_string(),
            contract,
            provider,
            model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            demos: Vec::new(),
        }
    }

    /// Model identifier used for requests.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builds the chat request for one invocation.
    fn build_request(&self, inputs: &Record) -> ChatRequest {
        let mut messages = vec![ChatMessage::system(build_system_prompt(&self.contract))];
        for demo in &self.demos {
            messages.push(ChatMessage::user(build_user_prompt(&self.contract, &demo.inputs)));
            messages.push(ChatMessage::assistant(build_demo_reply(
                &self.contract,
                &demo.outputs,
            )));
        }
        messages.push(ChatMessage::user(build_user_prompt(&self.contract, inputs)));

        ChatRequest::json(self.model.clone(), messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("name", &self.name)
            .field("contract", &self.contract.to_string())
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("demos", &self.demos.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Agent for Predictor {
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> &FieldContract {
        &self.contract
    }

    async fn invoke(&self, inputs: &Record) -> Result<Record> {
        let request = self.build_request(inputs);
        let response = self.provider.chat(&request).await?;
        debug!(
            agent = %self.name,
            model = %self.model,
            total_tokens = response.usage.total_tokens,
            "predictor completion received"
        );

        let truncated = response.is_truncated();
        match parse_completion(&response.content) {
            Ok(record) => Ok(record),
            Err(AgentError::ResponseParse { message, content }) if truncated => {
                Err(AgentError::ResponseParse {
                    message: format!(
                        "{message} (response truncated at max_tokens={}; consider raising it)",
                        self.max_tokens
                    ),
                    content,
                }
                .into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn boxed_clone(&self) -> Box<dyn Agent> {
        Box::new(self.clone())
    }

    fn set_instructions(&mut self, instructions: String) {
        self.contract = self.contract.clone().with_instructions(instructions);
    }

    fn demos(&self) -> &[Demo] {
        &self.demos
    }

    fn set_demos(&mut self, demos: Vec<Demo>) {
        self.demos = demos;
    }
}
