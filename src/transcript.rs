//! Conversation transcript
//!
//! The transcript is the only state a session carries between model steps.
//! It is append-only: messages are pushed, never edited or removed, and a
//! `TerminalAnswer` closes it.

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Tool requests and results
// ============================================================================

/// A lookup requested by the model during a reasoning step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRequest {
    /// Call id issued by the model, echoed back on the matching result
    pub id: String,
    /// Registry name of the requested tool
    pub name: String,
    /// Free-text query passed to the tool
    pub query: String,
}

impl ToolRequest {
    pub fn new(id: impl Into<String>, name: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            query: query.into(),
        }
    }
}

/// Why a tool call produced no usable output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailureKind {
    /// The model named a tool that is not registered
    UnknownTool,
    /// The tool ran and returned an error
    Failed,
    /// The tool did not answer within the configured timeout
    TimedOut,
}

impl ToolFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ToolFailureKind::UnknownTool => "unknown_tool",
            ToolFailureKind::Failed => "failed",
            ToolFailureKind::TimedOut => "timed_out",
        }
    }
}

/// The detail is for the model and the logs only; it is never serialized
/// into responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFailure {
    pub kind: ToolFailureKind,
    #[serde(skip_serializing)]
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(String),
    Failure(ToolFailure),
}

/// Outcome of one tool call, correlated to its request by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub request_id: String,
    pub name: String,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn success(request: &ToolRequest, output: impl Into<String>) -> Self {
        Self {
            request_id: request.id.clone(),
            name: request.name.clone(),
            outcome: ToolOutcome::Success(output.into()),
        }
    }

    pub fn failure(request: &ToolRequest, kind: ToolFailureKind, detail: impl Into<String>) -> Self {
        Self {
            request_id: request.id.clone(),
            name: request.name.clone(),
            outcome: ToolOutcome::Failure(ToolFailure {
                kind,
                detail: detail.into(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Failure(_))
    }

    /// Text handed back to the model
    pub fn text(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success(output) => output.clone(),
            ToolOutcome::Failure(failure) => {
                format!(
                    "Tool '{}' {}: {}",
                    self.name,
                    failure.kind.as_str(),
                    failure.detail
                )
            }
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Model output for one step: text plus any tool calls it asked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReasoningStep {
    pub content: String,
    pub tool_requests: Vec<ToolRequest>,
}

impl ReasoningStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_requests: Vec::new(),
        }
    }

    pub fn with_requests(content: impl Into<String>, tool_requests: Vec<ToolRequest>) -> Self {
        Self {
            content: content.into(),
            tool_requests,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    UserQuery,
    ReasoningStep,
    ToolResult,
    TerminalAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    UserQuery { content: String },
    ReasoningStep(ReasoningStep),
    ToolResult(ToolResult),
    TerminalAnswer { content: String },
}

impl Message {
    pub fn user_query(content: impl Into<String>) -> Self {
        Message::UserQuery {
            content: content.into(),
        }
    }

    pub fn terminal_answer(content: impl Into<String>) -> Self {
        Message::TerminalAnswer {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::UserQuery { .. } => MessageKind::UserQuery,
            Message::ReasoningStep(_) => MessageKind::ReasoningStep,
            Message::ToolResult(_) => MessageKind::ToolResult,
            Message::TerminalAnswer { .. } => MessageKind::TerminalAnswer,
        }
    }

    /// Free-text content. Tool results expose their raw output; failures
    /// carry no content of their own.
    pub fn content(&self) -> &str {
        match self {
            Message::UserQuery { content } | Message::TerminalAnswer { content } => content,
            Message::ReasoningStep(step) => &step.content,
            Message::ToolResult(result) => match &result.outcome {
                ToolOutcome::Success(output) => output,
                ToolOutcome::Failure(_) => "",
            },
        }
    }

    /// Tool calls still waiting on results (only reasoning steps carry any)
    pub fn tool_requests(&self) -> &[ToolRequest] {
        match self {
            Message::ReasoningStep(step) => &step.tool_requests,
            _ => &[],
        }
    }
}

// ============================================================================
// Terminal marker
// ============================================================================

/// Sentinel phrase the model uses to announce its final answer.
///
/// All terminal detection goes through [`TerminalMarker::matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalMarker {
    phrase: String,
}

impl TerminalMarker {
    pub const DEFAULT_PHRASE: &'static str = "Final Answer";

    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
        }
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Case-insensitive containment check
    pub fn matches(&self, text: &str) -> bool {
        text.to_lowercase().contains(&self.phrase.to_lowercase())
    }
}

impl Default for TerminalMarker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PHRASE)
    }
}

// ============================================================================
// Transcript
// ============================================================================

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("Transcript is closed by a terminal answer")]
    Closed,
    #[error("Tool result {0} does not answer a request of the latest reasoning step")]
    OrphanResult(String),
}

/// Ordered, append-only message history of one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a session from the user's question
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user_query(query)],
        }
    }

    /// Append a message.
    ///
    /// Tool results must answer a request of the most recent reasoning step,
    /// and nothing may follow a terminal answer.
    pub fn push(&mut self, message: Message) -> Result<(), TranscriptError> {
        if self.is_closed() {
            return Err(TranscriptError::Closed);
        }

        if let Message::ToolResult(result) = &message {
            let answers_request = self
                .messages
                .iter()
                .rev()
                .find(|m| m.kind() == MessageKind::ReasoningStep)
                .is_some_and(|step| {
                    step.tool_requests()
                        .iter()
                        .any(|req| req.id == result.request_id)
                });
            if !answers_request {
                return Err(TranscriptError::OrphanResult(result.request_id.clone()));
            }
        }

        self.messages.push(message);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.last(), Some(Message::TerminalAnswer { .. }))
    }

    /// Most recent message carrying the terminal marker
    pub fn final_answer(&self, marker: &TerminalMarker) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .map(Message::content)
            .find(|content| marker.matches(content))
    }

    /// Text to show the user: the final answer if one was given, otherwise
    /// whatever the last message says.
    pub fn display_answer(&self, marker: &TerminalMarker) -> String {
        self.final_answer(marker)
            .or_else(|| self.last().map(Message::content))
            .unwrap_or_default()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_step() -> ReasoningStep {
        ReasoningStep::with_requests(
            "Looking this up",
            vec![
                ToolRequest::new("call-1", "serper", "ibuprofen amlodipine"),
                ToolRequest::new("call-2", "wiki", "amlodipine"),
            ],
        )
    }

    #[test]
    fn test_new_transcript_holds_only_the_query() {
        let transcript = Transcript::new("Can I take ibuprofen with amlodipine?");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].kind(), MessageKind::UserQuery);
        assert!(!transcript.is_closed());
    }

    #[test]
    fn test_push_preserves_existing_messages() {
        let mut transcript = Transcript::new("q");
        let step = search_step();
        transcript.push(Message::ReasoningStep(step.clone())).unwrap();

        let before: Vec<Message> = transcript.messages().to_vec();
        let results = [
            ToolResult::success(&step.tool_requests[0], "interaction: may reduce effect"),
            ToolResult::failure(&step.tool_requests[1], ToolFailureKind::Failed, "HTTP 503"),
        ];
        for result in results {
            transcript.push(Message::ToolResult(result)).unwrap();
        }

        assert_eq!(transcript.len(), before.len() + 2);
        assert_eq!(&transcript.messages()[..before.len()], before.as_slice());
    }

    #[test]
    fn test_orphan_tool_result_rejected() {
        let mut transcript = Transcript::new("q");
        let stray = ToolRequest::new("nope", "serper", "x");
        let err = transcript
            .push(Message::ToolResult(ToolResult::success(&stray, "out")))
            .unwrap_err();
        assert_eq!(err, TranscriptError::OrphanResult("nope".to_string()));
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_terminal_answer_closes_transcript() {
        let mut transcript = Transcript::new("q");
        transcript
            .push(Message::terminal_answer("Final Answer: avoid combining"))
            .unwrap();
        assert!(transcript.is_closed());
        assert_eq!(
            transcript.push(Message::terminal_answer("Final Answer: again")),
            Err(TranscriptError::Closed)
        );
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        let marker = TerminalMarker::default();
        assert!(marker.matches("FINAL ANSWER: take with food"));
        assert!(marker.matches("final answer: take with food"));
        assert!(marker.matches("So, my Final Answer is no."));
        assert!(!marker.matches("The answer is final."));
    }

    #[test]
    fn test_display_answer_prefers_marked_message() {
        let marker = TerminalMarker::default();
        let mut transcript = Transcript::new("q");
        transcript
            .push(Message::ReasoningStep(ReasoningStep::text(
                "Final answer: consult your pharmacist",
            )))
            .unwrap();
        transcript
            .push(Message::ReasoningStep(ReasoningStep::text("trailing note")))
            .unwrap();

        assert_eq!(
            transcript.display_answer(&marker),
            "Final answer: consult your pharmacist"
        );
    }

    #[test]
    fn test_display_answer_falls_back_to_last_message() {
        let marker = TerminalMarker::default();
        let mut transcript = Transcript::new("q");
        transcript
            .push(Message::ReasoningStep(ReasoningStep::text("still thinking")))
            .unwrap();

        assert_eq!(transcript.final_answer(&marker), None);
        assert_eq!(transcript.display_answer(&marker), "still thinking");
    }

    #[test]
    fn test_failure_text_names_tool_and_kind() {
        let req = ToolRequest::new("c", "tavily", "q");
        let result = ToolResult::failure(&req, ToolFailureKind::TimedOut, "after 30s");
        assert!(result.is_error());
        assert_eq!(result.text(), "Tool 'tavily' timed_out: after 30s");
    }

    #[test]
    fn test_failure_detail_not_serialized() {
        let req = ToolRequest::new("c", "serper", "q");
        let mut transcript = Transcript::new("q");
        transcript
            .push(Message::ReasoningStep(ReasoningStep::with_requests("", vec![req.clone()])))
            .unwrap();
        transcript
            .push(Message::ToolResult(ToolResult::failure(
                &req,
                ToolFailureKind::Failed,
                "serper returned HTTP 403: key abc123 revoked",
            )))
            .unwrap();

        let json = serde_json::to_value(&transcript).unwrap();
        assert!(!json.to_string().contains("abc123"));
        assert_eq!(
            json[2]["outcome"],
            serde_json::json!({"status": "failure", "value": {"kind": "failed"}})
        );
    }
}
