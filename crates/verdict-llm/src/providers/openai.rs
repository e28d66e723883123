//! OpenAI-compatible chat completions provider
//!
//! Works against api.openai.com and any server speaking the same
//! `/chat/completions` dialect (LM Studio, vLLM, llama.cpp server).
//!
//! ```no_run
//! use verdict_llm::providers::{OpenAIConfig, OpenAIProvider};
//! use verdict_llm::{CompletionRequest, Message, ModelProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OpenAIProvider::with_config(
//!     OpenAIConfig::new("not-needed").with_api_base("http://localhost:1234/v1"),
//! )?;
//! let request = CompletionRequest::builder("local-model")
//!     .add_message(Message::user("Summarize AAPL news"))
//!     .build();
//! let response = provider.complete(request).await?;
//! println!("{:?}", response.message.text());
//! # Ok(())
//! # }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, Message, MessageContent, ModelError,
    ModelProvider, Result, Role, StopReason, TokenUsage, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL, e.g. "https://api.openai.com/v1" or "http://localhost:1234/v1"
    pub api_base: String,
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `OPENAI_API_KEY` and the optional `OPENAI_API_BASE`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            ModelError::ConfigurationError("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        let api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string());

        Ok(Self::new(api_key).with_api_base(api_base))
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self::new(String::new())
    }
}

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl ModelProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, purpose = request.purpose()))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to {}", self.config.api_base);

        let response_format = request
            .response_schema
            .clone()
            .map(|schema| ResponseFormat::json_schema(request.purpose(), schema));
        let body = OpenAIRequest {
            model: request.model.clone(),
            messages: build_openai_messages(request.system.clone(), request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            tools: request.tools.as_deref().map(convert_tools),
            response_format,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ModelError::Unavailable(e.to_string())
                } else {
                    ModelError::HttpError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), error_text));
        }

        let parsed: OpenAIResponse = response.json().await.map_err(|e| {
            ModelError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::UnexpectedResponse("No choices in response".to_string()))?;

        let usage = parsed.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });
        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            tokens = usage.total(),
            "Received completion"
        );

        Ok(CompletionResponse {
            stop_reason: map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop")),
            message: parse_openai_message(choice.message)?,
            usage,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
    strict: bool,
}

impl ResponseFormat {
    /// Constrain the answer to `schema`; the name must match `[a-zA-Z0-9_-]{1,64}`
    fn json_schema(purpose: &str, schema: Value) -> Self {
        let mut name: String = purpose
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .take(64)
            .collect();
        if name.is_empty() {
            name.push_str("answer");
        }
        Self {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name,
                schema,
                strict: false,
            },
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OpenAIToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    tool_type: String,
    function: OpenAIFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

fn map_status(status: u16, error_text: String) -> ModelError {
    match status {
        401 | 403 => ModelError::AuthenticationFailed,
        429 => ModelError::RateLimited(error_text),
        400 | 404 | 422 => ModelError::InvalidRequest(error_text),
        _ => ModelError::Unavailable(format!("HTTP {status}: {error_text}")),
    }
}

/// System prompt goes first in the messages array
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    let mut result = Vec::with_capacity(messages.len() + 1);
    if let Some(sys) = system {
        result.push(plain("system", sys));
    }
    for msg in messages {
        result.extend(convert_message(msg));
    }
    result
}

fn plain(role: &str, content: String) -> OpenAIMessage {
    OpenAIMessage {
        role: role.to_string(),
        content: Some(content),
        tool_calls: None,
        tool_call_id: None,
    }
}

/// Tool results become separate `tool` role messages
fn convert_message(msg: Message) -> Vec<OpenAIMessage> {
    let role = match msg.role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    };

    let blocks = match msg.content {
        Some(MessageContent::Text(text)) => return vec![plain(role, text)],
        Some(MessageContent::Blocks(blocks)) => blocks,
        None => return vec![plain(role, String::new())],
    };

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    let mut results = Vec::new();
    for block in blocks {
        match block {
            ContentBlock::Text { text: t } => text.push_str(&t),
            ContentBlock::ToolUse { id, name, input } => tool_calls.push(OpenAIToolCall {
                id,
                tool_type: function_type(),
                function: OpenAIFunctionCall {
                    name,
                    arguments: input.to_string(),
                },
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => results.push(OpenAIMessage {
                role: "tool".to_string(),
                content: Some(content),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            }),
        }
    }

    if !results.is_empty() {
        return results;
    }
    vec![OpenAIMessage {
        role: role.to_string(),
        content: (!text.is_empty()).then_some(text),
        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
        tool_call_id: None,
    }]
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAITool> {
    tools
        .iter()
        .map(|tool| OpenAITool {
            tool_type: function_type(),
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        })
        .collect()
}

fn parse_openai_message(msg: OpenAIResponseMessage) -> Result<Message> {
    let Some(calls) = msg.tool_calls.filter(|c| !c.is_empty()) else {
        return Ok(Message::assistant(msg.content.unwrap_or_default()));
    };

    let mut blocks = Vec::new();
    if let Some(text) = msg.content.filter(|t| !t.is_empty()) {
        blocks.push(ContentBlock::Text { text });
    }
    for call in calls {
        let input = if call.function.arguments.trim().is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(&call.function.arguments)?
        };
        blocks.push(ContentBlock::ToolUse {
            id: call.id,
            name: call.function.name,
            input,
        });
    }
    Ok(Message {
        role: Role::Assistant,
        content: Some(MessageContent::Blocks(blocks)),
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "length" => StopReason::MaxTokens,
        "tool_calls" | "function_call" => StopReason::ToolUse,
        _ => StopReason::EndTurn,
    }
}
