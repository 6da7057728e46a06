//! Agent state types

use crate::config::DEFAULT_MAX_MESSAGES;
use crate::transcript::{TerminalMarker, ToolRequest};
use serde::Serialize;

/// Agent control-loop state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AgentState {
    /// Waiting on (or about to request) the next model step
    #[default]
    Reason,

    /// Resolving the tool calls of the latest reasoning step
    Act {
        /// Requests whose results have not been appended yet
        pending: Vec<ToolRequest>,
    },

    /// Terminal; the transcript is the final output
    End { reason: EndReason },
}

impl AgentState {
    pub fn name(&self) -> &'static str {
        match self {
            AgentState::Reason => "reason",
            AgentState::Act { .. } => "act",
            AgentState::End { .. } => "end",
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The model gave its final answer
    TerminalMarker,
    /// The transcript hit the safety bound first; the answer is best-effort
    SafetyBound,
}

impl EndReason {
    pub fn is_complete(self) -> bool {
        matches!(self, EndReason::TerminalMarker)
    }
}

/// Fixed rules the decision function applies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopPolicy {
    /// Transcript length at which the loop is force-terminated
    pub max_messages: usize,
    pub marker: TerminalMarker,
}

impl LoopPolicy {
    pub fn new(max_messages: usize, marker: TerminalMarker) -> Self {
        Self {
            max_messages,
            marker,
        }
    }
}

impl Default for LoopPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES, TerminalMarker::default())
    }
}
