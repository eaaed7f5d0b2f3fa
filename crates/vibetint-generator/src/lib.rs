//! Generator boundary for vibetint.
//!
//! Provides Anthropic and Gemini API clients behind one trait, with:
//! - Streaming (SSE) support, delivering raw text chunks to the caller
//! - Prompt construction for the theme protocol and the JSON payload path
//! - Explicit per-request sessions with token usage accounting
//!
//! Nothing in this crate knows what the generated text means. Theme
//! parsing and application live downstream.

pub mod anthropic;
pub mod gemini;
pub mod prompts;
pub mod session;
pub mod sse;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use gemini::{GeminiClient, GeminiConfig};
pub use session::{GenerationSession, SessionState};

/// Callback invoked with each raw text chunk as it streams in.
pub type ChunkHandler = Box<dyn Fn(String) + Send + Sync>;

#[async_trait]
pub trait GeneratorClient: Send + Sync {
    /// Send the conversation and wait for the complete response.
    async fn generate(&self, messages: &[Message]) -> Result<GeneratorResponse, GeneratorError>;

    /// Send the conversation, calling `on_chunk` with text as it arrives,
    /// and return the assembled response when the stream closes.
    async fn generate_streaming(
        &self,
        messages: &[Message],
        on_chunk: ChunkHandler,
    ) -> Result<GeneratorResponse, GeneratorError>;
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct GeneratorResponse {
    pub content: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Timeout")]
    Timeout,
    #[error("{0}")]
    NotConfigured(String),
}

/// Which generator backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(GeneratorError::NotConfigured(format!(
                "unknown provider '{other}' (expected anthropic or gemini)"
            ))),
        }
    }
}

/// Build a client for the chosen provider from environment credentials,
/// with an optional model override.
pub fn client_for(
    provider: Provider,
    model: Option<&str>,
) -> Result<Arc<dyn GeneratorClient>, GeneratorError> {
    match provider {
        Provider::Anthropic => {
            let mut config = AnthropicConfig::from_env()?;
            if let Some(model) = model {
                config = config.with_model(model);
            }
            Ok(Arc::new(AnthropicClient::new(config)))
        }
        Provider::Gemini => {
            let mut config = GeminiConfig::from_env()?;
            if let Some(model) = model {
                config = config.with_model(model);
            }
            Ok(Arc::new(GeminiClient::new(config)))
        }
    }
}
