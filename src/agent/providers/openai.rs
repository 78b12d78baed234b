//! `OpenAI` provider implementation using the `async-openai` crate.
//!
//! Works against any `OpenAI`-compatible chat completion endpoint (`OpenAI`,
//! Azure, vLLM, Ollama) through the base URL override in [`AgentConfig`].
//! Predictor requests always ask for a JSON object reply.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    CreateChatCompletionResponse, ResponseFormat,
};
use async_trait::async_trait;
use tracing::debug;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::error::AgentError;

/// `OpenAI`-compatible chat completion backend.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Creates a provider from the key and base URL in `config`.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);
        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }
        Self {
            client: Client::with_config(openai_config),
        }
    }
}

fn to_openai_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
    let text = msg.content.clone();
    match msg.role {
        Role::System => ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
            content: ChatCompletionRequestSystemMessageContent::Text(text),
            name: None,
        }),
        Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(text),
            name: None,
        }),
        #[allow(deprecated)]
        Role::Assistant => {
            ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                content: Some(ChatCompletionRequestAssistantMessageContent::Text(text)),
                name: None,
                tool_calls: None,
                refusal: None,
                audio: None,
                function_call: None,
            })
        }
    }
}

fn to_openai_request(request: &ChatRequest) -> CreateChatCompletionRequest {
    CreateChatCompletionRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(to_openai_message).collect(),
        temperature: request.temperature,
        max_completion_tokens: request.max_tokens,
        response_format: request.json_mode.then_some(ResponseFormat::JsonObject),
        ..Default::default()
    }
}

/// Takes the first choice of a completion. A refusal is reported as a
/// parse failure.
fn from_openai_response(
    response: CreateChatCompletionResponse,
) -> Result<ChatResponse, AgentError> {
    let usage = response
        .usage
        .map_or_else(TokenUsage::default, |u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AgentError::ApiRequest {
            message: "completion contained no choices".to_string(),
            status: None,
        })?;

    let finish_reason = choice
        .finish_reason
        .map(|reason| format!("{reason:?}").to_lowercase());

    if let Some(refusal) = choice.message.refusal {
        return Err(AgentError::ResponseParse {
            message: format!("model refused: {refusal}"),
            content: String::new(),
        });
    }

    let content = choice.message.content.unwrap_or_default();
    Ok(ChatResponse {
        content,
        usage,
        finish_reason,
    })
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );
        let response = self
            .client
            .chat()
            .create(to_openai_request(request))
            .await
            .map_err(|e| AgentError::ApiRequest {
                message: e.to_string(),
                status: None,
            })?;
        from_openai_response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn completion(message: serde_json::Value, finish_reason: &str) -> CreateChatCompletionResponse {
        serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 0,
            "model": "gpt-4o-mini",
            "choices": [{ "index": 0, "message": message, "finish_reason": finish_reason }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17 }
        }))
        .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_message_roles_map() {
        let system = to_openai_message(&ChatMessage::system("contract"));
        assert!(matches!(system, ChatCompletionRequestMessage::System(_)));
        let user = to_openai_message(&ChatMessage::user("inputs"));
        assert!(matches!(user, ChatCompletionRequestMessage::User(_)));
        let demo = to_openai_message(&ChatMessage::assistant("{}"));
        assert!(matches!(demo, ChatCompletionRequestMessage::Assistant(_)));
    }

    #[test]
    fn test_json_request() {
        let request = ChatRequest::json("gpt-4o-mini", vec![ChatMessage::user("q")])
            .with_max_tokens(100);
        let built = to_openai_request(&request);
        assert!(matches!(built.response_format, Some(ResponseFormat::JsonObject)));
        assert_eq!(built.max_completion_tokens, Some(100));
        assert!(built.temperature.is_none());
        assert_eq!(built.messages.len(), 1);
    }

    #[test]
    fn test_plain_request_has_no_response_format() {
        let mut request = ChatRequest::json("gpt-4o-mini", vec![ChatMessage::user("q")]);
        request.json_mode = false;
        assert!(to_openai_request(&request).response_format.is_none());
    }

    #[test]
    fn test_response_conversion() {
        let response = from_openai_response(completion(
            json!({ "role": "assistant", "content": "{\"ready\": true}" }),
            "length",
        ))
        .unwrap_or_else(|_| unreachable!());
        assert_eq!(response.content, "{\"ready\": true}");
        assert_eq!(response.usage.total_tokens, 17);
        assert!(response.is_truncated());
    }

    #[test]
    fn test_refusal_is_parse_error() {
        let result = from_openai_response(completion(
            json!({ "role": "assistant", "content": null, "refusal": "cannot help" }),
            "stop",
        ));
        assert!(matches!(result, Err(AgentError::ResponseParse { .. })));
    }
}
