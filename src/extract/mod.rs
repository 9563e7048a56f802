//! Structured extraction: given a natural-language prompt and a registered
//! schema, ask the model provider for structured output and validate what
//! comes back. One attempt per call; retry policy belongs to the caller.

use crate::llm::{ChatCompletionRequest, ChatMessage, JsonSchemaFormat, LlmClient};
use crate::schema::SchemaRegistry;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Single,
    Array,
}

/// Extraction failures keep "the provider broke" and "the output did not
/// conform" apart; callers that retry must not conflate the two.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    #[error("model provider error: {0}")]
    Provider(String),

    #[error("output did not conform to schema '{schema}': {violation}")]
    SchemaMismatch { schema: String, violation: String },
}

impl From<ExtractError> for crate::Error {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::Provider(msg) => crate::Error::Llm(msg),
            ExtractError::SchemaMismatch { .. } => crate::Error::SchemaMismatch(e.to_string()),
            other => crate::Error::Validation(other.to_string()),
        }
    }
}

/// Array-mode payloads travel wrapped in a single-key object because the
/// provider's structured output must be a top-level JSON object.
const ARRAY_WRAPPER_KEY: &str = "items";

#[derive(Clone)]
pub struct Extractor {
    llm: Arc<dyn LlmClient>,
    registry: Arc<SchemaRegistry>,
}

impl Extractor {
    pub fn new(llm: Arc<dyn LlmClient>, registry: Arc<SchemaRegistry>) -> Self {
        Self { llm, registry }
    }

    /// Produces a value conforming to the named schema, or a typed failure.
    /// In `Array` mode the result is a JSON array of zero or more conforming
    /// objects.
    pub async fn extract(
        &self,
        prompt: &str,
        schema_name: &str,
        mode: OutputMode,
    ) -> Result<Value, ExtractError> {
        if prompt.trim().is_empty() {
            return Err(ExtractError::EmptyPrompt);
        }

        let schema = self
            .registry
            .get(schema_name)
            .ok_or_else(|| ExtractError::UnknownSchema(schema_name.to_string()))?;

        let object_schema = schema.to_json_schema();
        let wire_schema = match mode {
            OutputMode::Single => object_schema,
            OutputMode::Array => json!({
                "type": "object",
                "properties": {
                    ARRAY_WRAPPER_KEY: {"type": "array", "items": object_schema}
                },
                "required": [ARRAY_WRAPPER_KEY],
            }),
        };

        let request = ChatCompletionRequest {
            messages: vec![ChatMessage::user(prompt)],
            tools: vec![],
            max_tokens: None,
            temperature: None,
            response_format: Some(JsonSchemaFormat {
                name: schema_name.to_string(),
                schema: wire_schema,
            }),
        };

        let response = self
            .llm
            .create_chat_completion(request)
            .await
            .map_err(|e| ExtractError::Provider(e.to_string()))?;

        let content = response
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or_default();

        let parsed: Value =
            serde_json::from_str(content).map_err(|e| ExtractError::SchemaMismatch {
                schema: schema_name.to_string(),
                violation: format!("output is not valid JSON: {}", e),
            })?;

        let result = match mode {
            OutputMode::Single => {
                schema
                    .validate(&parsed)
                    .map_err(|v| ExtractError::SchemaMismatch {
                        schema: schema_name.to_string(),
                        violation: v.to_string(),
                    })?;
                parsed
            }
            OutputMode::Array => {
                let items = parsed
                    .get(ARRAY_WRAPPER_KEY)
                    .and_then(Value::as_array)
                    .cloned()
                    .ok_or_else(|| ExtractError::SchemaMismatch {
                        schema: schema_name.to_string(),
                        violation: format!("output is missing the '{}' array", ARRAY_WRAPPER_KEY),
                    })?;
                for item in &items {
                    schema
                        .validate(item)
                        .map_err(|v| ExtractError::SchemaMismatch {
                            schema: schema_name.to_string(),
                            violation: v.to_string(),
                        })?;
                }
                Value::Array(items)
            }
        };

        debug!(schema = schema_name, "extraction succeeded");
        Ok(result)
    }
}
