//! API request and response types

use crate::state_machine::EndReason;
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};

/// Question submitted from the form
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

/// Result of one advisor session
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    /// False when the session was cut off by the safety bound
    pub complete: bool,
    pub end_reason: EndReason,
    pub messages: Transcript,
}

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ToolsResponse {
    pub tools: Vec<ToolInfo>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
