//! Per-request generation sessions.

use std::sync::Arc;

use tracing::debug;

use vibetint_common::SessionId;

use crate::{ChunkHandler, GeneratorClient, GeneratorError, GeneratorResponse, Message, TokenUsage};

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No request issued yet.
    Created,
    /// Last request completed.
    Ready,
    /// Last request failed.
    Error,
}

/// A generation session: one client, accumulated token usage, and the
/// outcome of the most recent request. Exclusive borrow on the generation
/// methods keeps a session to one in-flight request at a time.
pub struct GenerationSession {
    id: SessionId,
    client: Arc<dyn GeneratorClient>,
    state: SessionState,
    usage: TokenUsage,
}

impl GenerationSession {
    pub fn new(client: Arc<dyn GeneratorClient>) -> Self {
        Self {
            id: SessionId::new(),
            client,
            state: SessionState::Created,
            usage: TokenUsage::default(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Record a failure that happened downstream of the request itself,
    /// e.g. an unusable response body.
    pub fn mark_error(&mut self) {
        self.state = SessionState::Error;
    }

    /// Total usage across all requests in this session.
    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Forget accumulated usage and outcome.
    pub fn reset(&mut self) {
        self.state = SessionState::Created;
        self.usage = TokenUsage::default();
    }

    pub async fn generate(
        &mut self,
        messages: &[Message],
    ) -> Result<GeneratorResponse, GeneratorError> {
        let result = self.client.generate(messages).await;
        self.record(&result);
        result
    }

    pub async fn generate_streaming(
        &mut self,
        messages: &[Message],
        on_chunk: ChunkHandler,
    ) -> Result<GeneratorResponse, GeneratorError> {
        let result = self.client.generate_streaming(messages, on_chunk).await;
        self.record(&result);
        result
    }

    fn record(&mut self, result: &Result<GeneratorResponse, GeneratorError>) {
        match result {
            Ok(response) => {
                self.usage.input_tokens = self
                    .usage
                    .input_tokens
                    .saturating_add(response.usage.input_tokens);
                self.usage.output_tokens = self
                    .usage
                    .output_tokens
                    .saturating_add(response.usage.output_tokens);
                self.state = SessionState::Ready;
                debug!(
                    session = %self.id,
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "generation complete"
                );
            }
            Err(e) => {
                self.state = SessionState::Error;
                debug!(session = %self.id, error = %e, "generation failed");
            }
        }
    }
}
