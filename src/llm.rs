//! Language-model provider abstraction
//!
//! Provides a common interface for the chat model driving the agent.

mod error;
mod models;
mod openai;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use models::{all_models, find_model, ModelDef, DEFAULT_MODEL};
pub use openai::OpenAIService;
pub use types::*;

use crate::config::{ConfigError, LlmConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for model providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;

    /// Get the context window size in tokens
    fn context_window(&self) -> usize;
}

/// Build the configured model service, wrapped with request logging.
///
/// An unknown model id is a configuration error, reported before any
/// conversation starts.
pub fn create_service(config: &LlmConfig) -> Result<Arc<dyn LlmService>, ConfigError> {
    let model = find_model(&config.model)
        .ok_or_else(|| ConfigError::UnknownModel(config.model.clone()))?;

    let service = OpenAIService::new(config.api_key.clone(), model, config.base_url.as_deref())
        .map_err(|e| ConfigError::InvalidValue("OPENAI_BASE_URL".to_string(), e.message))?;

    Ok(Arc::new(LoggingService::new(Arc::new(service))))
}

/// Logging wrapper for model services
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
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    history_len = request.messages.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    tool_calls = response.tool_uses().len(),
                    "Model request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "Model request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn context_window(&self) -> usize {
        self.inner.context_window()
    }
}
