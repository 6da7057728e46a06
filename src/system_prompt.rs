//! System prompt for the advisor persona
//!
//! The prompt fixes the persona, its goals and the terminal-marker
//! convention the loop relies on to stop. The tool catalog is appended so
//! the model sees the same names the registry dispatches on.

use crate::llm::ToolDefinition;
use crate::transcript::TerminalMarker;
use std::fmt::Write;

/// Base system prompt establishing the advisor's role
const BASE_PROMPT: &str = r"You are a Medical Information and Drug Interaction Advisor.
Your goals are:
- Identify medicines for symptoms,
- Detect potential drug interactions,
- Suggest usage guidance, side effects, dosages.

Each step, reason step by step and call the BEST tool if needed.";

/// Build the system prompt for a session.
///
/// The closing instructions name the marker phrase the loop watches for,
/// so changing the marker keeps prompt and detection in step.
pub fn build_system_prompt(marker: &TerminalMarker, tools: &[ToolDefinition]) -> String {
    let mut prompt = String::from(BASE_PROMPT);

    if !tools.is_empty() {
        prompt.push_str("\n\nAvailable tools:");
        for tool in tools {
            let _ = write!(prompt, "\n- {}: {}", tool.name, tool.description);
        }
    }

    let phrase = marker.phrase();
    let _ = write!(
        prompt,
        "\n\n**ALWAYS** end your dialog with:\n{phrase}: <summary with drug info, dosage, and safety advice>\n\nDo NOT call more tools after your '{phrase}:'."
    );

    prompt
}
