//! Pure decision and transition functions
//!
//! Neither function performs I/O: given the same inputs they always produce
//! the same outputs.

use super::{AgentState, Effect, EndReason, Event, LoopPolicy};
use crate::transcript::{Message, Transcript};
use thiserror::Error;

/// What the loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Reason,
    Act,
    End(EndReason),
}

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: AgentState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: AgentState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Agent loop has already terminated")]
    Terminated,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Classify the transcript.
///
/// Only the last message and the transcript length are consulted. Rules are
/// applied in order: terminal marker, safety bound, pending tool calls,
/// otherwise another reasoning step.
///
/// The bound holds for the whole session: a tool batch is only started when
/// its results plus the step that reads them still fit under it.
pub fn decide(transcript: &Transcript, policy: &LoopPolicy) -> Decision {
    let Some(last) = transcript.last() else {
        return Decision::Reason;
    };

    if policy.marker.matches(last.content()) {
        return Decision::End(EndReason::TerminalMarker);
    }

    let len = transcript.len();
    if len >= policy.max_messages {
        return Decision::End(EndReason::SafetyBound);
    }

    match last {
        Message::ReasoningStep(step) if !step.tool_requests.is_empty() => {
            if len + step.tool_requests.len() + 1 > policy.max_messages {
                Decision::End(EndReason::SafetyBound)
            } else {
                Decision::Act
            }
        }
        _ => Decision::Reason,
    }
}

/// Pure transition function
pub fn transition(
    state: &AgentState,
    event: Event,
    transcript: &Transcript,
    policy: &LoopPolicy,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        (AgentState::End { .. }, _) => Err(TransitionError::Terminated),

        (AgentState::Reason, Event::StepAppended) => Ok(match decide(transcript, policy) {
            Decision::End(reason) => TransitionResult::new(AgentState::End { reason })
                .with_effect(Effect::finish(reason)),
            Decision::Act => {
                let pending = transcript
                    .last()
                    .map(|m| m.tool_requests().to_vec())
                    .unwrap_or_default();
                TransitionResult::new(AgentState::Act {
                    pending: pending.clone(),
                })
                .with_effect(Effect::invoke_tools(pending))
            }
            Decision::Reason => {
                TransitionResult::new(AgentState::Reason).with_effect(Effect::RequestStep)
            }
        }),

        // Tool results always go back to the model
        (AgentState::Act { pending }, Event::ToolsResolved { count }) => {
            if count != pending.len() {
                return Err(TransitionError::InvalidTransition(format!(
                    "{} tool calls pending but {} resolved",
                    pending.len(),
                    count
                )));
            }
            Ok(TransitionResult::new(AgentState::Reason).with_effect(Effect::RequestStep))
        }

        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} on {:?}",
            state.name(),
            event
        ))),
    }
}
