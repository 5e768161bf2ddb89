//! OpenAI Chat Completions client implementing `LlmClient` (ChatOpenAI).
//!
//! Requires `OPENAI_API_KEY` (or explicit config). Tool specs arrive per call from the chat graph,
//! so the same client serves rounds with tools and the final capped round without them.
//!
//! **Interaction**: Implements `LlmClient`; built by `build_chat_graph`. Depends on `async_openai`
//! (feature `openai`).

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use crate::llm::{LlmClient, LlmResponse, ModelError};
use crate::message::{Message, ToolCall};
use crate::stream::MessageChunk;
use crate::tools::ToolSpec;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::chat::{
        ChatCompletionMessageToolCall, ChatCompletionMessageToolCalls,
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessage, ChatCompletionRequestToolMessageArgs,
        ChatCompletionRequestUserMessage, ChatCompletionTool, ChatCompletionToolChoiceOption,
        ChatCompletionTools, CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        FunctionCall, FunctionObject, ToolChoiceOptions,
    },
    Client,
};

use super::ToolChoiceMode;

/// OpenAI Chat Completions client implementing `LlmClient`.
///
/// Uses `OPENAI_API_KEY` from the environment by default; or provide config via
/// `ChatOpenAI::with_config` (custom key or base URL).
pub struct ChatOpenAI {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: Option<f32>,
    tool_choice: Option<ToolChoiceMode>,
    system_prompt: Option<String>,
}

/// Tool call being assembled from stream deltas.
#[derive(Default)]
struct PartialToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl ChatOpenAI {
    /// Build client with default config (API key from `OPENAI_API_KEY` env).
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new(), model)
    }

    /// Build client with custom config (e.g. custom API key or base URL).
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::with_config(config),
            model: model.into(),
            temperature: None,
            tool_choice: None,
            system_prompt: None,
        }
    }

    /// Set temperature (0-2). Lower values are more deterministic.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set tool choice mode. Only sent when the call offers tools.
    pub fn with_tool_choice(mut self, mode: ToolChoiceMode) -> Self {
        self.tool_choice = Some(mode);
        self
    }

    /// System prompt prepended to every request; never stored in the thread.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages_to_request(
        &self,
        messages: &[Message],
    ) -> Result<Vec<ChatCompletionRequestMessage>, ModelError> {
        let mut out = Vec::with_capacity(messages.len() + 1);
        if let Some(ref prompt) = self.system_prompt {
            out.push(ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessage::from(prompt.as_str()),
            ));
        }
        for m in messages {
            let converted = match m {
                Message::User { content } => ChatCompletionRequestMessage::User(
                    ChatCompletionRequestUserMessage::from(content.as_str()),
                ),
                Message::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                    if !content.is_empty() || tool_calls.is_empty() {
                        args.content(content.as_str());
                    }
                    if !tool_calls.is_empty() {
                        let calls: Vec<ChatCompletionMessageToolCalls> = tool_calls
                            .iter()
                            .map(|c| {
                                ChatCompletionMessageToolCalls::Function(
                                    ChatCompletionMessageToolCall {
                                        id: c.id.clone(),
                                        function: FunctionCall {
                                            name: c.name.clone(),
                                            arguments: c.arguments.to_string(),
                                        },
                                    },
                                )
                            })
                            .collect();
                        args.tool_calls(calls);
                    }
                    ChatCompletionRequestMessage::Assistant(args.build().map_err(map_error)?)
                }
                Message::Tool(result) => ChatCompletionRequestMessage::Tool(
                    ChatCompletionRequestToolMessageArgs::default()
                        .tool_call_id(result.call_id.clone())
                        .content(m.content().into_owned())
                        .build()
                        .map_err(map_error)?,
                ),
            };
            out.push(converted);
        }
        Ok(out)
    }

    fn build_request(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<CreateChatCompletionRequest, ModelError> {
        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone());
        args.messages(self.messages_to_request(messages)?);

        if !tools.is_empty() {
            let chat_tools: Vec<ChatCompletionTools> = tools
                .iter()
                .map(|t| {
                    ChatCompletionTools::Function(ChatCompletionTool {
                        function: FunctionObject {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: Some(t.input_schema.clone()),
                            ..Default::default()
                        },
                    })
                })
                .collect();
            args.tools(chat_tools);

            if let Some(mode) = self.tool_choice {
                let opt = match mode {
                    ToolChoiceMode::Auto => ToolChoiceOptions::Auto,
                    ToolChoiceMode::None => ToolChoiceOptions::None,
                    ToolChoiceMode::Required => ToolChoiceOptions::Required,
                };
                args.tool_choice(ChatCompletionToolChoiceOption::Mode(opt));
            }
        }

        if let Some(t) = self.temperature {
            args.temperature(t);
        }

        args.build().map_err(map_error)
    }
}

/// Error types and codes for requests that fail the same way every time (bad key, unknown model,
/// malformed request, exhausted quota).
const PERMANENT_API_ERRORS: &[&str] = &[
    "invalid_request_error",
    "authentication_error",
    "permission_error",
    "not_found_error",
    "invalid_api_key",
    "model_not_found",
    "context_length_exceeded",
    "insufficient_quota",
];

fn is_permanent(err: &ApiError) -> bool {
    [err.r#type.as_deref(), err.code.as_deref()]
        .into_iter()
        .flatten()
        .any(|s| PERMANENT_API_ERRORS.contains(&s))
}

/// Only transport, rate-limit and server-side failures are retryable; rejected requests, bad
/// arguments and undecodable responses map to `InvalidResponse`.
fn map_error(e: OpenAIError) -> ModelError {
    match e {
        OpenAIError::InvalidArgument(msg) => ModelError::InvalidResponse(msg),
        OpenAIError::JSONDeserialize(..) => ModelError::InvalidResponse(e.to_string()),
        OpenAIError::ApiError(ref api) if is_permanent(api) => {
            ModelError::InvalidResponse(format!("OpenAI API rejected the request: {}", api))
        }
        other => ModelError::Unavailable(format!("OpenAI API error: {}", other)),
    }
}

/// Tool call arguments arrive as a JSON string; an empty string means no arguments.
fn parse_arguments(name: &str, raw: &str) -> Result<serde_json::Value, ModelError> {
    if raw.trim().is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    serde_json::from_str(raw).map_err(|e| {
        ModelError::InvalidResponse(format!("tool call '{}' has malformed arguments: {}", name, e))
    })
}

#[async_trait]
impl LlmClient for ChatOpenAI {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, ModelError> {
        let request = self.build_request(messages, tools)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_error)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("OpenAI returned no choices".to_string()))?;

        let msg = choice.message;
        let content = msg.content.unwrap_or_default();
        let mut tool_calls = Vec::new();
        for tc in msg.tool_calls.unwrap_or_default() {
            if let ChatCompletionMessageToolCalls::Function(f) = tc {
                let arguments = parse_arguments(&f.function.name, &f.function.arguments)?;
                tool_calls.push(ToolCall::new(f.id, f.function.name, arguments));
            }
        }

        Ok(LlmResponse {
            content,
            tool_calls,
        })
    }

    /// Streams content deltas through `chunk_tx`; tool call fragments are accumulated by index.
    async fn invoke_stream(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
        chunk_tx: Option<mpsc::Sender<MessageChunk>>,
    ) -> Result<LlmResponse, ModelError> {
        let mut request = self.build_request(messages, tools)?;
        request.stream = Some(true);

        let mut stream = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(map_error)?;

        let mut content = String::new();
        let mut partial: BTreeMap<u32, PartialToolCall> = BTreeMap::new();

        while let Some(item) = stream.next().await {
            let response = item.map_err(map_error)?;
            for choice in response.choices {
                if let Some(delta) = choice.delta.content {
                    if !delta.is_empty() {
                        content.push_str(&delta);
                        if let Some(ref tx) = chunk_tx {
                            let _ = tx.send(MessageChunk { content: delta }).await;
                        }
                    }
                }
                for tc in choice.delta.tool_calls.unwrap_or_default() {
                    let entry = partial.entry(tc.index).or_default();
                    if let Some(id) = tc.id {
                        entry.id = id;
                    }
                    if let Some(f) = tc.function {
                        if let Some(name) = f.name {
                            entry.name.push_str(&name);
                        }
                        if let Some(args) = f.arguments {
                            entry.arguments.push_str(&args);
                        }
                    }
                }
            }
        }

        let mut tool_calls = Vec::with_capacity(partial.len());
        for (_, p) in partial {
            let arguments = parse_arguments(&p.name, &p.arguments)?;
            tool_calls.push(ToolCall::new(p.id, p.name, arguments));
        }

        Ok(LlmResponse {
            content,
            tool_calls,
        })
    }
}

#[cfg(all(test, feature = "openai"))]
mod tests {
    use super::*;
    use crate::message::{ToolPayload, ToolResult};
    use serde_json::json;

    /// **Scenario**: ChatOpenAI::with_config uses custom config and model.
    #[test]
    fn chat_openai_with_config_creates_client() {
        let config = OpenAIConfig::new().with_api_key("test-key");
        let llm = ChatOpenAI::with_config(config, "gpt-4o-mini").with_temperature(0.2);
        assert_eq!(llm.model(), "gpt-4o-mini");
    }

    /// **Scenario**: A full tool round converts into system + user + assistant + tool messages.
    #[test]
    fn messages_to_request_covers_tool_round() {
        let llm = ChatOpenAI::with_config(OpenAIConfig::new().with_api_key("k"), "gpt-4o-mini")
            .with_system_prompt("be brief");
        let history = vec![
            Message::user("add 3 and 4"),
            Message::assistant_with_tool_calls(
                "",
                vec![ToolCall::new(
                    "c1",
                    "calculator",
                    json!({"first_num": 3, "second_num": 4, "operation": "add"}),
                )],
            ),
            Message::tool(ToolResult {
                call_id: "c1".into(),
                name: "calculator".into(),
                payload: ToolPayload::Success {
                    result: json!({"result": 7}),
                },
            }),
        ];
        let req = llm.messages_to_request(&history).unwrap();
        assert_eq!(req.len(), 4);
        assert!(matches!(req[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(req[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(req[3], ChatCompletionRequestMessage::Tool(_)));
    }

    /// **Scenario**: Request offers tools only when given some.
    #[test]
    fn build_request_omits_empty_tools() {
        let llm = ChatOpenAI::with_config(OpenAIConfig::new().with_api_key("k"), "gpt-4o-mini")
            .with_tool_choice(ToolChoiceMode::Required);
        let req = llm.build_request(&[Message::user("hi")], &[]).unwrap();
        assert!(req.tools.is_none());
        assert!(req.tool_choice.is_none());

        let spec = ToolSpec {
            name: "calculator".into(),
            description: None,
            input_schema: json!({"type": "object"}),
        };
        let req = llm.build_request(&[Message::user("hi")], &[spec]).unwrap();
        assert_eq!(req.tools.map(|t| t.len()), Some(1));
        assert!(req.tool_choice.is_some());
    }

    #[test]
    fn parse_arguments_handles_empty_and_malformed() {
        assert_eq!(parse_arguments("f", "").unwrap(), json!({}));
        assert_eq!(parse_arguments("f", "{\"a\":1}").unwrap(), json!({"a": 1}));
        assert!(matches!(
            parse_arguments("f", "{oops"),
            Err(ModelError::InvalidResponse(_))
        ));
    }

    fn api_error(r#type: Option<&str>, code: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "request failed".into(),
            r#type: r#type.map(String::from),
            param: None,
            code: code.map(String::from),
        })
    }

    /// **Scenario**: Rejected requests (bad key, unknown model, invalid request) are not retried.
    #[test]
    fn permanent_api_errors_are_not_retryable() {
        for err in [
            api_error(Some("invalid_request_error"), None),
            api_error(None, Some("invalid_api_key")),
            api_error(Some("invalid_request_error"), Some("model_not_found")),
            api_error(Some("insufficient_quota"), Some("insufficient_quota")),
        ] {
            let mapped = map_error(err);
            assert!(matches!(mapped, ModelError::InvalidResponse(_)), "{:?}", mapped);
            assert!(!mapped.is_retryable());
        }
    }

    /// **Scenario**: Rate limits, server errors and untyped failures stay retryable.
    #[test]
    fn transient_api_errors_are_retryable() {
        for err in [
            api_error(Some("requests"), Some("rate_limit_exceeded")),
            api_error(Some("server_error"), None),
            api_error(None, None),
        ] {
            assert!(map_error(err).is_retryable());
        }
    }
}
