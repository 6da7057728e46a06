//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::transition::*;
use super::*;
use crate::transcript::{Message, ReasoningStep, TerminalMarker, ToolRequest, ToolResult, Transcript};
use proptest::prelude::*;

const MAX_TOOLS_PER_STEP: usize = 3;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_tool_request() -> impl Strategy<Value = ToolRequest> {
    (
        "[a-z]{8}",
        prop_oneof![Just("serper"), Just("google_search"), Just("wiki"), Just("tavily")],
        "[a-z ]{1,30}",
    )
        .prop_map(|(id, name, query)| ToolRequest::new(id, name, query))
}

fn arb_plain_text() -> impl Strategy<Value = String> {
    "[a-z ]{0,40}"
}

fn arb_marker_text() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("Final Answer"), Just("FINAL ANSWER"), Just("final answer"), Just("fInAl AnSwEr")],
        "[a-z ]{0,20}",
        "[a-z ]{0,20}",
    )
        .prop_map(|(marker, before, after)| format!("{before}{marker}: {after}"))
}

/// Model steps that never finish: text or tool calls, no marker
fn arb_open_step() -> impl Strategy<Value = ReasoningStep> {
    (
        arb_plain_text(),
        prop::collection::vec(arb_tool_request(), 0..=MAX_TOOLS_PER_STEP),
    )
        .prop_map(|(content, requests)| ReasoningStep::with_requests(content, uniquify(requests)))
}

fn arb_step() -> impl Strategy<Value = ReasoningStep> {
    prop_oneof![
        4 => arb_open_step(),
        1 => arb_marker_text().prop_map(ReasoningStep::text),
    ]
}

/// Distinct call ids within one step, as a real model issues them
fn uniquify(requests: Vec<ToolRequest>) -> Vec<ToolRequest> {
    requests
        .into_iter()
        .enumerate()
        .map(|(i, mut req)| {
            req.id = format!("{}-{}", req.id, i);
            req
        })
        .collect()
}

// ============================================================================
// Simulation
// ============================================================================

/// Drive the machine against a scripted model, resolving every tool call
/// successfully. Returns the final transcript and end reason.
fn simulate(
    query: &str,
    script: &[ReasoningStep],
    policy: &LoopPolicy,
) -> (Transcript, EndReason) {
    let mut transcript = Transcript::new(query);
    let mut state = AgentState::Reason;
    let mut effects = vec![Effect::RequestStep];
    let mut steps_taken = 0usize;

    while let Some(effect) = effects.pop() {
        let event = match effect {
            Effect::RequestStep => {
                let step = script[steps_taken % script.len()].clone();
                steps_taken += 1;
                let message = if policy.marker.matches(&step.content) {
                    Message::terminal_answer(step.content)
                } else {
                    Message::ReasoningStep(step)
                };
                transcript.push(message).unwrap();
                Event::StepAppended
            }
            Effect::InvokeTools { requests } => {
                for req in &requests {
                    transcript
                        .push(Message::ToolResult(ToolResult::success(req, "result")))
                        .unwrap();
                }
                Event::ToolsResolved {
                    count: requests.len(),
                }
            }
            Effect::Finish { reason } => return (transcript, reason),
        };

        let result = transition(&state, event, &transcript, policy).unwrap();
        state = result.new_state;
        effects.extend(result.effects.into_iter().rev());

        assert!(
            steps_taken <= policy.max_messages,
            "loop exceeded {} model steps",
            policy.max_messages
        );
    }

    panic!("effect queue drained without Finish");
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Identical (last message, length) pairs give identical decisions
    #[test]
    fn prop_decide_depends_on_last_message_and_length(
        prefix_a in prop::collection::vec(arb_plain_text(), 0..6),
        prefix_b in prop::collection::vec(arb_plain_text(), 0..6),
        last in arb_step(),
        max_messages in 2usize..10,
    ) {
        let policy = LoopPolicy::new(max_messages, TerminalMarker::default());
        let build = |prefix: &[String], pad: usize| {
            let mut t = Transcript::new("q");
            for text in prefix {
                t.push(Message::ReasoningStep(ReasoningStep::text(text.clone()))).unwrap();
            }
            for _ in 0..pad {
                t.push(Message::ReasoningStep(ReasoningStep::text("pad"))).unwrap();
            }
            t.push(Message::ReasoningStep(last.clone())).unwrap();
            t
        };

        // Pad the shorter prefix so both transcripts have the same length
        let len = prefix_a.len().max(prefix_b.len());
        let a = build(&prefix_a, len - prefix_a.len());
        let b = build(&prefix_b, len - prefix_b.len());
        prop_assert_eq!(a.len(), b.len());

        prop_assert_eq!(decide(&a, &policy), decide(&b, &policy));
        prop_assert_eq!(decide(&a, &policy), decide(&a, &policy));
    }

    /// Every run terminates without the transcript exceeding the bound
    #[test]
    fn prop_loop_terminates_within_bound(
        script in prop::collection::vec(arb_step(), 1..8),
        max_messages in 2usize..20,
    ) {
        let policy = LoopPolicy::new(max_messages, TerminalMarker::default());
        let (transcript, reason) = simulate("q", &script, &policy);

        prop_assert!(
            transcript.len() <= max_messages,
            "transcript length {} exceeds bound {}",
            transcript.len(),
            max_messages
        );
        if reason == EndReason::TerminalMarker {
            prop_assert!(transcript.is_closed());
        }
    }

    /// A model that never calls tools and never finishes stops at exactly
    /// the bound
    #[test]
    fn prop_text_only_model_hits_bound_exactly(
        texts in prop::collection::vec(arb_plain_text(), 1..5),
        max_messages in 2usize..20,
    ) {
        let policy = LoopPolicy::new(max_messages, TerminalMarker::default());
        let script: Vec<ReasoningStep> = texts.into_iter().map(ReasoningStep::text).collect();
        let (transcript, reason) = simulate("q", &script, &policy);

        prop_assert_eq!(reason, EndReason::SafetyBound);
        prop_assert_eq!(transcript.len(), max_messages);
    }

    /// Terminal detection ignores case
    #[test]
    fn prop_marker_case_insensitive(text in arb_marker_text()) {
        let mut t = Transcript::new("q");
        t.push(Message::ReasoningStep(ReasoningStep::text(text))).unwrap();
        prop_assert_eq!(
            decide(&t, &LoopPolicy::default()),
            Decision::End(EndReason::TerminalMarker)
        );
    }

    /// End never accepts another event
    #[test]
    fn prop_end_is_absorbing(count in 0usize..5, safety in any::<bool>()) {
        let reason = if safety { EndReason::SafetyBound } else { EndReason::TerminalMarker };
        let state = AgentState::End { reason };
        let t = Transcript::new("q");
        let policy = LoopPolicy::default();

        prop_assert_eq!(
            transition(&state, Event::StepAppended, &t, &policy).unwrap_err(),
            TransitionError::Terminated
        );
        prop_assert_eq!(
            transition(&state, Event::ToolsResolved { count }, &t, &policy).unwrap_err(),
            TransitionError::Terminated
        );
    }
}
