//! Google Gemini client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::sse::{parse_sse_stream, SseEvent};
use crate::{ChunkHandler, GeneratorClient, GeneratorError, GeneratorResponse, Message, Role, TokenUsage};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Gemini client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f64,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: 4096,
            temperature: 0.7,
        }
    }

    /// Read credentials from `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self, GeneratorError> {
        match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(GeneratorError::NotConfigured(
                "Gemini is not configured. Set GEMINI_API_KEY.".into(),
            )),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Gemini generateContent client.
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .timeout(Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    fn api_url(&self, stream: bool) -> String {
        let method = if stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        let mut url = format!(
            "{GEMINI_API_BASE}/{}:{method}?key={}",
            self.config.model, self.config.api_key
        );
        if stream {
            url.push_str("&alt=sse");
        }
        url
    }

    /// Build the generateContent body. Gemini calls the assistant role
    /// `model` and takes the system prompt as a separate `systemInstruction`.
    fn build_request_body(&self, messages: &[Message]) -> serde_json::Value {
        let mut contents = Vec::new();
        for msg in messages {
            let role = match msg.role {
                Role::User => "user",
                Role::Assistant => "model",
                Role::System => continue,
            };
            contents.push(serde_json::json!({
                "role": role,
                "parts": [{ "text": msg.content }],
            }));
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": self.config.max_output_tokens,
                "temperature": self.config.temperature,
            },
        });

        if let Some(system) = messages.iter().find(|m| m.role == Role::System) {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": system.content }],
            });
        }

        body
    }

    async fn send_request(&self, url: &str, body: &serde_json::Value) -> Result<reqwest::Response, GeneratorError> {
        let response = self
            .http
            .post(url)
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
}

/// Concatenated text of the first candidate's parts.
fn extract_text(json: &serde_json::Value) -> String {
    let mut text = String::new();
    if let Some(parts) = json["candidates"][0]["content"]["parts"].as_array() {
        for part in parts {
            if let Some(t) = part["text"].as_str() {
                text.push_str(t);
            }
        }
    }
    text
}

fn extract_usage(json: &serde_json::Value) -> Option<TokenUsage> {
    let meta = json.get("usageMetadata")?;
    Some(TokenUsage {
        input_tokens: meta["promptTokenCount"].as_u64().unwrap_or(0),
        output_tokens: meta["candidatesTokenCount"].as_u64().unwrap_or(0),
    })
}

#[async_trait]
impl GeneratorClient for GeminiClient {
    async fn generate(&self, messages: &[Message]) -> Result<GeneratorResponse, GeneratorError> {
        let body = self.build_request_body(messages);

        debug!(model = %self.config.model, "Gemini API request");

        let response = self.send_request(&self.api_url(false), &body).await?;
        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        Ok(GeneratorResponse {
            content: extract_text(&json),
            usage: extract_usage(&json).unwrap_or_default(),
        })
    }

    async fn generate_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkHandler,
    ) -> Result<GeneratorResponse, GeneratorError> {
        let body = self.build_request_body(messages);

        debug!(model = %self.config.model, "Gemini API streaming request");

        let response = self.send_request(&self.api_url(true), &body).await?;

        let mut full_content = String::new();
        let mut usage = None;

        parse_sse_stream(response, |event: SseEvent| {
            let Ok(data) = serde_json::from_str::<serde_json::Value>(&event.data) else {
                return;
            };
            let text = extract_text(&data);
            if !text.is_empty() {
                full_content.push_str(&text);
                on_chunk(text);
            }
            // Usage arrives on the final chunk; keep the latest seen.
            if let Some(u) = extract_usage(&data) {
                usage = Some(u);
            }
        })
        .await?;

        if usage.is_none() {
            warn!("no usage data received in streaming response");
        }

        Ok(GeneratorResponse {
            content: full_content,
            usage: usage.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(GeminiConfig::new("test-key"))
    }

    #[test]
    fn url_switches_method_for_streaming() {
        let c = client();
        assert!(c.api_url(false).contains(":generateContent?key=test-key"));
        let streaming = c.api_url(true);
        assert!(streaming.contains(":streamGenerateContent?"));
        assert!(streaming.ends_with("&alt=sse"));
    }

    #[test]
    fn body_maps_roles_and_system_instruction() {
        let messages = [
            Message::system("you design themes"),
            Message::user("make it warm"),
            Message::assistant("TOKEN:comment=#777777"),
        ];
        let body = client().build_request_body(&messages);

        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "you design themes");
    }

    #[test]
    fn extracts_candidate_text_and_usage() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "SELECTOR:" }, { "text": "editor.background=#000000" }] }
            }],
            "usageMetadata": { "promptTokenCount": 9, "candidatesTokenCount": 21 }
        });
        assert_eq!(extract_text(&json), "SELECTOR:editor.background=#000000");
        let usage = extract_usage(&json).unwrap();
        assert_eq!(usage.total_tokens(), 30);
    }

    #[test]
    fn missing_candidates_yield_empty_text() {
        let json = serde_json::json!({ "promptFeedback": {} });
        assert_eq!(extract_text(&json), "");
        assert!(extract_usage(&json).is_none());
    }

    #[test]
    fn debug_redacts_the_key() {
        let rendered = format!("{:?}", GeminiConfig::new("g-secret"));
        assert!(!rendered.contains("g-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
