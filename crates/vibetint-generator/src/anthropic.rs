//! Anthropic Messages API client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::sse::{parse_sse_stream, SseEvent};
use crate::{ChunkHandler, GeneratorClient, GeneratorError, GeneratorResponse, Message, Role, TokenUsage};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic client configuration.
#[derive(Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    /// Read credentials from `ANTHROPIC_API_KEY`.
    pub fn from_env() -> Result<Self, GeneratorError> {
        match std::env::var("ANTHROPIC_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(GeneratorError::NotConfigured(
                "Anthropic is not configured. Set ANTHROPIC_API_KEY.".into(),
            )),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Anthropic Messages API client.
pub struct AnthropicClient {
    config: AnthropicConfig,
    http: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Build the Messages API request body. The system role travels in the
    /// top-level `system` field, not the messages array.
    fn build_request_body(&self, messages: &[Message], stream: bool) -> serde_json::Value {
        let mut msgs = Vec::new();
        for msg in messages {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => continue,
            };
            msgs.push(serde_json::json!({
                "role": role,
                "content": msg.content,
            }));
        }

        let mut body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": msgs,
        });

        if let Some(system) = messages.iter().find(|m| m.role == Role::System) {
            body["system"] = serde_json::json!(system.content);
        }

        if stream {
            body["stream"] = serde_json::json!(true);
        }

        body
    }

    async fn send_request(&self, body: &serde_json::Value) -> Result<reqwest::Response, GeneratorError> {
        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout
                } else {
                    GeneratorError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeneratorError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let text = text.chars().take(200).collect::<String>();
            return Err(GeneratorError::Api(format!("HTTP {status}: {text}")));
        }
        Ok(response)
    }

    /// Parse a non-streaming response: first text content block + usage.
    fn parse_response(&self, json: serde_json::Value) -> Result<GeneratorResponse, GeneratorError> {
        let content = json["content"]
            .as_array()
            .and_then(|blocks| {
                blocks.iter().find_map(|b| {
                    if b["type"] == "text" {
                        b["text"].as_str().map(String::from)
                    } else {
                        None
                    }
                })
            })
            .unwrap_or_default();

        let usage = TokenUsage {
            input_tokens: json["usage"]["input_tokens"].as_u64().unwrap_or(0),
            output_tokens: json["usage"]["output_tokens"].as_u64().unwrap_or(0),
        };

        Ok(GeneratorResponse { content, usage })
    }
}

#[async_trait]
impl GeneratorClient for AnthropicClient {
    async fn generate(&self, messages: &[Message]) -> Result<GeneratorResponse, GeneratorError> {
        let body = self.build_request_body(messages, false);

        debug!(model = %self.config.model, "Anthropic API request");

        let response = self.send_request(&body).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        self.parse_response(json)
    }

    async fn generate_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkHandler,
    ) -> Result<GeneratorResponse, GeneratorError> {
        let body = self.build_request_body(messages, true);

        debug!(model = %self.config.model, "Anthropic API streaming request");

        let response = self.send_request(&body).await?;

        let mut full_content = String::new();
        let mut usage = TokenUsage::default();

        parse_sse_stream(response, |event: SseEvent| {
            let event_type = event.event.as_deref().unwrap_or("");
            match event_type {
                "content_block_delta" => {
                    if let Ok(data) = serde_json::from_str::<serde_json::Value>(&event.data) {
                        if data["delta"]["type"] == "text_delta" {
                            if let Some(text) = data["delta"]["text"].as_str() {
                                full_content.push_str(text);
                                on_chunk(text.to_string());
                            }
                        }
                    }
                }
                "message_start" => {
                    if let Ok(data) = serde_json::from_str::<serde_json::Value>(&event.data) {
                        usage.input_tokens = data["message"]["usage"]["input_tokens"]
                            .as_u64()
                            .unwrap_or(0);
                    }
                }
                "message_delta" => {
                    if let Ok(data) = serde_json::from_str::<serde_json::Value>(&event.data) {
                        if let Some(u) = data.get("usage") {
                            usage.output_tokens = u["output_tokens"].as_u64().unwrap_or(0);
                        }
                    }
                }
                _ => {}
            }
        })
        .await?;

        if usage.input_tokens == 0 && usage.output_tokens == 0 {
            warn!("no usage data received in streaming response");
        }

        Ok(GeneratorResponse {
            content: full_content,
            usage,
        })
    }
}
