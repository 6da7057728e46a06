//! Agent session executor

use super::traits::{LlmClient, ToolExecutor};
use super::{AgentError, Outcome};

use crate::config::AgentConfig;
use crate::llm::{ContentBlock, LlmError, LlmMessage, LlmRequest, LlmResponse, SystemContent};
use crate::state_machine::{transition, AgentState, Effect, Event, LoopPolicy};
use crate::system_prompt::build_system_prompt;
use crate::tools::query_from_input;
use crate::transcript::{Message, ReasoningStep, ToolRequest, Transcript};
use serde_json::json;
use std::collections::VecDeque;
use std::time::Duration;
use uuid::Uuid;

/// Drives one session at a time from a user query to a terminal state.
///
/// The orchestrator itself is immutable; each `run` owns its own transcript,
/// so one instance can serve many concurrent sessions.
pub struct Orchestrator<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    llm: L,
    tools: T,
    policy: LoopPolicy,
    system_prompt: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    llm_timeout: Duration,
}

impl<L, T> Orchestrator<L, T>
where
    L: LlmClient,
    T: ToolExecutor,
{
    pub fn new(llm: L, tools: T, policy: LoopPolicy) -> Self {
        let system_prompt = build_system_prompt(&policy.marker, &tools.definitions());
        Self {
            llm,
            tools,
            policy,
            system_prompt,
            temperature: None,
            max_tokens: None,
            llm_timeout: AgentConfig::default().llm_timeout,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &LoopPolicy {
        &self.policy
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Run a session to completion.
    ///
    /// Model errors abort the session and propagate; tool errors never do.
    pub async fn run(&self, query: &str) -> Result<Outcome, AgentError> {
        let session_id = Uuid::new_v4();
        tracing::info!(session = %session_id, model = %self.model_id(), "Starting agent session");

        let mut transcript = Transcript::new(query);
        let mut state = AgentState::Reason;
        let mut effects = VecDeque::from([Effect::RequestStep]);

        while let Some(effect) = effects.pop_front() {
            let event = match effect {
                Effect::RequestStep => {
                    self.step(&mut transcript).await?;
                    Event::StepAppended
                }
                Effect::InvokeTools { requests } => {
                    let count = self.act(&mut transcript, &requests).await?;
                    Event::ToolsResolved { count }
                }
                Effect::Finish { reason } => {
                    tracing::info!(
                        session = %session_id,
                        ?reason,
                        messages = transcript.len(),
                        "Agent session finished"
                    );
                    return Ok(Outcome::new(transcript, reason, &self.policy.marker));
                }
            };

            let result = transition(&state, event, &transcript, &self.policy)?;
            tracing::debug!(
                session = %session_id,
                from = state.name(),
                to = result.new_state.name(),
                messages = transcript.len(),
                "State transition"
            );
            state = result.new_state;
            effects.extend(result.effects);
        }

        Err(AgentError::Stalled)
    }

    /// Ask the model for the next step and append it.
    ///
    /// A reply carrying the terminal marker closes the transcript as a
    /// terminal answer; anything else is recorded as a reasoning step.
    pub async fn step(&self, transcript: &mut Transcript) -> Result<ReasoningStep, AgentError> {
        let request = LlmRequest {
            system: vec![SystemContent::new(&self.system_prompt)],
            messages: build_llm_messages(transcript),
            tools: self.tools.definitions(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = tokio::time::timeout(self.llm_timeout, self.llm.complete(&request))
            .await
            .map_err(|_| LlmError::timeout(self.llm_timeout))??;

        let step = response_to_step(&response);

        if self.policy.marker.matches(&step.content) {
            if !step.tool_requests.is_empty() {
                tracing::warn!(
                    dropped = step.tool_requests.len(),
                    "Ignoring tool calls issued alongside the final answer"
                );
            }
            transcript.push(Message::terminal_answer(step.content.clone()))?;
        } else {
            transcript.push(Message::ReasoningStep(step.clone()))?;
        }

        Ok(step)
    }

    /// Resolve a batch of tool calls and append the results in request order.
    /// Returns how many results were appended.
    pub async fn act(
        &self,
        transcript: &mut Transcript,
        requests: &[ToolRequest],
    ) -> Result<usize, AgentError> {
        let results = self.tools.invoke_all(requests).await;
        let count = results.len();
        for result in results {
            transcript.push(Message::ToolResult(result))?;
        }
        Ok(count)
    }
}

fn response_to_step(response: &LlmResponse) -> ReasoningStep {
    let requests = response
        .tool_uses()
        .into_iter()
        .map(|(id, name, input)| ToolRequest::new(id, name, query_from_input(input)))
        .collect();
    ReasoningStep::with_requests(response.text(), requests)
}

/// Convert the transcript into model history.
///
/// Consecutive tool results are folded into a single user message so each
/// assistant turn with tool calls is followed by exactly one reply turn.
pub fn build_llm_messages(transcript: &Transcript) -> Vec<LlmMessage> {
    let mut messages: Vec<LlmMessage> = Vec::new();
    let mut pending_results: Vec<ContentBlock> = Vec::new();

    for message in transcript.iter() {
        if let Message::ToolResult(result) = message {
            pending_results.push(ContentBlock::tool_result(
                &result.request_id,
                result.text(),
                result.is_error(),
            ));
            continue;
        }

        if !pending_results.is_empty() {
            messages.push(LlmMessage::user(std::mem::take(&mut pending_results)));
        }

        match message {
            Message::UserQuery { content } => {
                messages.push(LlmMessage::user(vec![ContentBlock::text(content)]));
            }
            Message::ReasoningStep(step) => {
                let mut blocks = Vec::with_capacity(step.tool_requests.len() + 1);
                if !step.content.is_empty() {
                    blocks.push(ContentBlock::text(&step.content));
                }
                blocks.extend(step.tool_requests.iter().map(|req| {
                    ContentBlock::tool_use(&req.id, &req.name, json!({ "query": req.query }))
                }));
                if blocks.is_empty() {
                    blocks.push(ContentBlock::text(""));
                }
                messages.push(LlmMessage::assistant(blocks));
            }
            Message::TerminalAnswer { content } => {
                messages.push(LlmMessage::assistant(vec![ContentBlock::text(content)]));
            }
            Message::ToolResult(_) => {}
        }
    }

    if !pending_results.is_empty() {
        messages.push(LlmMessage::user(pending_results));
    }

    messages
}
