//! Search tools and the tool invoker
//!
//! Every tool takes one free-text query and returns text. The registry is
//! built once at startup and shared read-only by all sessions.

mod google_search;
mod serper;
mod tavily;
mod wikipedia;

pub use google_search::GoogleSearchTool;
pub use serper::SerperTool;
pub use tavily::TavilyTool;
pub use wikipedia::WikipediaTool;

use crate::config::SearchConfig;
use crate::llm::ToolDefinition;
use crate::transcript::{ToolFailureKind, ToolRequest, ToolResult};
use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Upper bound on tool output handed to the model
pub const MAX_OUTPUT_CHARS: usize = 8_000;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Never carries the request URL; some providers take keys as query
    /// parameters
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid response from {provider}: {detail}")]
    InvalidResponse {
        provider: &'static str,
        detail: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for ToolError {
    fn from(err: reqwest::Error) -> Self {
        ToolError::Http(err.without_url())
    }
}

/// A lookup capability the model can call by name
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name
    fn name(&self) -> &str;

    /// Tool description for the model
    fn description(&self) -> String;

    /// JSON schema for tool input
    fn input_schema(&self) -> Value {
        query_schema("The search query")
    }

    /// Run the lookup
    async fn invoke(&self, query: &str) -> Result<String, ToolError>;
}

/// Schema shared by all single-query tools
pub fn query_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "required": ["query"],
        "properties": {
            "query": {
                "type": "string",
                "description": description
            }
        }
    })
}

/// Pull the query string out of model-supplied tool arguments.
///
/// Models sometimes send a bare string instead of `{"query": ...}`; any
/// other shape is passed through as its JSON text.
pub fn query_from_input(input: &Value) -> String {
    match input {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("query") {
            Some(Value::String(q)) => q.clone(),
            _ => input.to_string(),
        },
        other => other.to_string(),
    }
}

/// Send a request and turn non-2xx statuses into [`ToolError::Status`]
pub(crate) async fn send_checked(
    provider: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response, ToolError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ToolError::Status {
        provider,
        status: status.as_u16(),
        body: truncate_output(&body, 500),
    })
}

/// Cut text to at most `max_chars` characters, marking the cut
pub fn truncate_output(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => {
            let mut cut = text.get(..byte_idx).unwrap_or(text).to_string();
            cut.push_str("\n[truncated]");
            cut
        }
    }
}

/// Static, read-only collection of tools available to every session
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    timeout: Duration,
}

impl ToolRegistry {
    pub fn new(tools: Vec<Arc<dyn Tool>>, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    /// The four search providers
    pub fn standard(config: &SearchConfig, timeout: Duration) -> Result<Self, ToolError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("rx-advisor/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(SerperTool::new(client.clone(), config.serper_api_key.clone())),
            Arc::new(GoogleSearchTool::new(
                client.clone(),
                config.google_api_key.clone(),
                config.google_cse_id.clone(),
            )),
            Arc::new(WikipediaTool::new(client.clone())),
            Arc::new(TavilyTool::new(client, config.tavily_api_key.clone())),
        ];
        Ok(Self::new(tools, timeout))
    }

    /// Get all tool definitions for the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    /// Resolve one request. Never fails: unknown names, tool errors and
    /// timeouts all come back as failure results.
    pub async fn invoke(&self, request: &ToolRequest) -> ToolResult {
        let Some(tool) = self.get(&request.name) else {
            tracing::warn!(tool = %request.name, "Model requested unknown tool");
            return ToolResult::failure(
                request,
                ToolFailureKind::UnknownTool,
                format!("No tool named '{}' is registered", request.name),
            );
        };

        let start = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, tool.invoke(&request.query)).await;
        let duration_ms = start.elapsed().as_millis();

        match outcome {
            Ok(Ok(output)) => {
                tracing::info!(
                    tool = %request.name,
                    duration_ms = %duration_ms,
                    output_len = output.len(),
                    "Tool call completed"
                );
                ToolResult::success(request, truncate_output(&output, MAX_OUTPUT_CHARS))
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    tool = %request.name,
                    duration_ms = %duration_ms,
                    error = %e,
                    "Tool call failed"
                );
                ToolResult::failure(request, ToolFailureKind::Failed, e.to_string())
            }
            Err(_) => {
                tracing::warn!(tool = %request.name, timeout_s = self.timeout.as_secs(), "Tool call timed out");
                ToolResult::failure(
                    request,
                    ToolFailureKind::TimedOut,
                    format!("No response within {}s", self.timeout.as_secs()),
                )
            }
        }
    }

    /// Resolve a batch concurrently. Results come back in request order.
    pub async fn invoke_all(&self, requests: &[ToolRequest]) -> Vec<ToolResult> {
        join_all(requests.iter().map(|request| self.invoke(request))).await
    }
}
