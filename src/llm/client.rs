use super::types::*;
use crate::{Result, config::LlmConfig};
use async_openai::{Client, config::OpenAIConfig, types as openai_types};
use async_trait::async_trait;
use futures::StreamExt;
use std::pin::Pin;
use tracing::debug;

pub type ChatStream = Pin<Box<dyn futures::Stream<Item = Result<ChatStreamChunk>> + Send>>;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single blocking completion. Used by the structured extractor, where
    /// the whole body must be parsed as one JSON document anyway.
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse>;

    /// Incremental completion. The conversation orchestrator forwards the
    /// content deltas to the caller as they arrive.
    async fn create_chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatStream>;
}

pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key);

        if !config.base_url.is_empty() {
            openai_config = openai_config.with_api_base(config.base_url);
        }

        let client = Client::with_config(openai_config);

        Self {
            client,
            model: config.model,
        }
    }

    fn build_request(
        &self,
        request: ChatCompletionRequest,
        stream: bool,
    ) -> Result<openai_types::CreateChatCompletionRequest> {
        let mut messages = Vec::new();
        for msg in request.messages {
            messages.push(msg.to_openai_message()?);
        }

        let tools: Option<Vec<openai_types::ChatCompletionTool>> = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .into_iter()
                    .map(|tool| tool.to_openai_tool())
                    .collect(),
            )
        };

        let mut request_builder = openai_types::CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .messages(messages)
            .stream(stream)
            .temperature(request.temperature.unwrap_or(0.7));

        if let Some(tools) = tools {
            request_builder.tools(tools);
        }

        if let Some(max_tokens) = request.max_tokens {
            request_builder.max_tokens(max_tokens as u32);
        }

        if let Some(format) = request.response_format {
            request_builder.response_format(openai_types::ResponseFormat::JsonSchema {
                json_schema: openai_types::ResponseFormatJsonSchema {
                    description: None,
                    name: format.name,
                    schema: Some(format.schema),
                    strict: None,
                },
            });
        }

        Ok(request_builder.build()?)
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        debug!(
            "Creating chat completion with {} messages",
            request.messages.len()
        );

        let openai_request = self.build_request(request, false)?;
        let response = self.client.chat().create(openai_request).await?;

        debug!(
            "Received chat completion response with {} choices",
            response.choices.len()
        );

        // Convert OpenAI response to our types
        let choices: Vec<Choice> = response
            .choices
            .into_iter()
            .map(|choice| {
                let tool_calls = choice.message.tool_calls.map(|tcs| {
                    tcs.into_iter()
                        .map(|tc| ToolCall {
                            id: tc.id,
                            function: FunctionCall {
                                name: tc.function.name,
                                arguments: tc.function.arguments,
                            },
                        })
                        .collect()
                });

                let message = ChatMessage {
                    role: choice.message.role.to_string(),
                    content: choice.message.content.unwrap_or_default(),
                    tool_calls,
                    tool_call_id: None,
                    name: None,
                };

                Choice {
                    index: choice.index,
                    message,
                    finish_reason: choice.finish_reason.map(|fr| format!("{fr:?}")),
                }
            })
            .collect();

        let usage = response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ChatCompletionResponse {
            id: response.id,
            model: response.model,
            choices,
            usage,
        })
    }

    async fn create_chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatStream> {
        debug!(
            "Creating streaming chat completion with {} messages",
            request.messages.len()
        );

        let openai_request = self.build_request(request, true)?;
        let stream = self.client.chat().create_stream(openai_request).await?;

        let mapped = stream.map(|item| {
            let response = item?;
            let mut chunk = ChatStreamChunk::default();

            if let Some(choice) = response.choices.into_iter().next() {
                chunk.content = choice.delta.content;
                if let Some(tool_calls) = choice.delta.tool_calls {
                    chunk.tool_calls = tool_calls
                        .into_iter()
                        .map(|tc| ToolCallChunk {
                            index: tc.index as usize,
                            id: tc.id,
                            name: tc.function.as_ref().and_then(|f| f.name.clone()),
                            arguments: tc.function.and_then(|f| f.arguments),
                        })
                        .collect();
                }
                chunk.finish_reason = choice.finish_reason.map(|fr| match fr {
                    openai_types::FinishReason::Stop => StreamFinishReason::Stop,
                    openai_types::FinishReason::Length => StreamFinishReason::Length,
                    openai_types::FinishReason::ToolCalls => StreamFinishReason::ToolCalls,
                    openai_types::FinishReason::ContentFilter => StreamFinishReason::ContentFilter,
                    openai_types::FinishReason::FunctionCall => StreamFinishReason::ToolCalls,
                });
            }

            Ok(chunk)
        });

        Ok(Box::pin(mapped))
    }
}
