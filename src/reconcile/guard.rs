//! Persistence guard: the last line of defense before a durable write.
//!
//! Re-validates every tool part against the message invariant independently
//! of the reconcile buffer. This invariant has been violated through more
//! than one code path historically, so every persistence path (checkpoint
//! and final) goes through [`guard_message`].

use crate::types::{empty_input, ChatMessage, ContentPart, ToolState};

/// Validate and repair a message so it always satisfies the invariant:
/// every tool part past `PendingCall` has a non-empty input.
///
/// An offending part is dropped with a structured warning rather than
/// failing the write: losing one tool part beats losing the whole message.
pub fn guard_message(mut message: ChatMessage) -> ChatMessage {
    let thread_id = message.thread_id.clone();
    message.parts.retain(|part| match part {
        ContentPart::Tool {
            tool_call_id,
            tool_name,
            input,
            state,
            ..
        } if *state != ToolState::PendingCall && empty_input(input) => {
            tracing::warn!(
                thread_id = %thread_id,
                tool_call_id = %tool_call_id,
                tool_name = %tool_name,
                reason = "empty-input",
                "guard dropped invalid tool part before persistence"
            );
            false
        }
        _ => true,
    });

    // Post-guard violation is a logic bug, not a runtime condition.
    debug_assert!(satisfies_invariant(&message));
    message
}

/// Whether every tool part with an output state has a non-empty input.
pub fn satisfies_invariant(message: &ChatMessage) -> bool {
    message.parts.iter().all(|part| match part {
        ContentPart::Tool { input, state, .. } => {
            *state == ToolState::PendingCall || !empty_input(input)
        }
        ContentPart::Text { .. } => true,
    })
}
