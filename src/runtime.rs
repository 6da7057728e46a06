//! Runtime for executing agent sessions
//!
//! The executor owns one session's transcript, feeds events into the pure
//! state machine and carries out the effects it returns.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{build_llm_messages, Orchestrator};
pub use traits::*;

use crate::llm::LlmError;
use crate::state_machine::{EndReason, TransitionError};
use crate::tools::ToolRegistry;
use crate::transcript::{TerminalMarker, Transcript, TranscriptError};
use std::sync::Arc;
use thiserror::Error;

/// Orchestrator wired to the real model service and search tools
pub type ProductionOrchestrator = Orchestrator<ServiceLlmClient, Arc<ToolRegistry>>;

/// Failure that aborts a session
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("state machine rejected event: {0}")]
    Transition(#[from] TransitionError),

    #[error("transcript rejected message: {0}")]
    Transcript(#[from] TranscriptError),

    #[error("effect queue drained before the session ended")]
    Stalled,
}

/// Finished session
#[derive(Debug, Clone)]
pub struct Outcome {
    pub transcript: Transcript,
    pub end_reason: EndReason,
    /// Text to present: the final answer, or the last message when the
    /// safety bound cut the session short
    pub answer: String,
}

impl Outcome {
    pub fn new(transcript: Transcript, end_reason: EndReason, marker: &TerminalMarker) -> Self {
        let answer = transcript.display_answer(marker);
        Self {
            transcript,
            end_reason,
            answer,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.end_reason.is_complete()
    }
}
