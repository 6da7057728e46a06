//! Events that drive state transitions

/// Something the runtime finished doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A model step was appended to the transcript
    StepAppended,

    /// All pending tool calls were resolved and their results appended
    ToolsResolved { count: usize },
}
