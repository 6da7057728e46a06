//! HTTP API for the advisor
//!
//! A single form page plus a JSON endpoint that runs one agent session per
//! request.

mod assets;
mod handlers;
mod types;

pub use handlers::create_router;

use crate::llm::ToolDefinition;
use crate::runtime::{AgentError, LlmClient, Orchestrator, Outcome, ToolExecutor};
use async_trait::async_trait;
use std::sync::Arc;

/// Something that can answer a question end to end
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn ask(&self, query: &str) -> Result<Outcome, AgentError>;

    /// Tools offered to the model
    fn tools(&self) -> Vec<ToolDefinition>;

    fn model_id(&self) -> &str;
}

#[async_trait]
impl<L, T> Advisor for Orchestrator<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    async fn ask(&self, query: &str) -> Result<Outcome, AgentError> {
        self.run(query).await
    }

    fn tools(&self) -> Vec<ToolDefinition> {
        Orchestrator::tools(self).definitions()
    }

    fn model_id(&self) -> &str {
        Orchestrator::model_id(self)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<dyn Advisor>,
}

impl AppState {
    pub fn new(advisor: Arc<dyn Advisor>) -> Self {
        Self { advisor }
    }
}
