//! LLM provider abstraction
//!
//! Provides the interface the step client uses to reach the generation
//! endpoint, plus the Gemini implementation.

mod error;
mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::{GeminiConfig, GeminiService};
pub use types::*;

use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request authenticated with `api_key`
    async fn complete(
        &self,
        request: &LlmRequest,
        api_key: &SecretString,
    ) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: LlmService + ?Sized> LlmService for Arc<T> {
    async fn complete(
        &self,
        request: &LlmRequest,
        api_key: &SecretString,
    ) -> Result<LlmResponse, LlmError> {
        (**self).complete(request, api_key).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(
        &self,
        request: &LlmRequest,
        api_key: &SecretString,
    ) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request, api_key).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    turns = request.messages.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    turns = request.messages.len(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
