//! Effects produced by state transitions

use super::state::EndReason;
use crate::transcript::ToolRequest;

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Call the model with the full transcript
    RequestStep,

    /// Resolve these tool calls and append their results in order
    InvokeTools { requests: Vec<ToolRequest> },

    /// Stop; the transcript is final
    Finish { reason: EndReason },
}

impl Effect {
    pub fn invoke_tools(requests: Vec<ToolRequest>) -> Self {
        Effect::InvokeTools { requests }
    }

    pub fn finish(reason: EndReason) -> Self {
        Effect::Finish { reason }
    }
}
