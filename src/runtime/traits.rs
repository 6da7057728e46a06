//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService, ToolDefinition};
use crate::tools::ToolRegistry;
use crate::transcript::{ToolRequest, ToolResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for making model requests
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a model request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Executor for tool batches
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Resolve every request; results come back in request order
    async fn invoke_all(&self, requests: &[ToolRequest]) -> Vec<ToolResult>;

    /// Get tool definitions for the model
    fn definitions(&self) -> Vec<ToolDefinition>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for Arc<T> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        (**self).complete(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

#[async_trait]
impl<T: ToolExecutor + ?Sized> ToolExecutor for Arc<T> {
    async fn invoke_all(&self, requests: &[ToolRequest]) -> Vec<ToolResult> {
        (**self).invoke_all(requests).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        (**self).definitions()
    }
}

// ============================================================================
// Production implementations
// ============================================================================

/// Model client backed by a configured [`LlmService`]
#[derive(Clone)]
pub struct ServiceLlmClient {
    service: Arc<dyn LlmService>,
}

impl ServiceLlmClient {
    pub fn new(service: Arc<dyn LlmService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl LlmClient for ServiceLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.service.complete(request).await
    }

    fn model_id(&self) -> &str {
        self.service.model_id()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn invoke_all(&self, requests: &[ToolRequest]) -> Vec<ToolResult> {
        ToolRegistry::invoke_all(self, requests).await
    }

    fn definitions(&self) -> Vec<ToolDefinition> {
        ToolRegistry::definitions(self)
    }
}
