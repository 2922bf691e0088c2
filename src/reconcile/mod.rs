//! Reconciliation of a turn's event stream into one coherent message.
//!
//! The buffer is the record-of-truth side of the stream tee: it accumulates
//! every [`TurnEvent`] of one turn and finalizes them into a single
//! persistable [`ChatMessage`]. Tool results are matched to their
//! originating calls by `tool_call_id`; a result with no valid call record
//! (orphan) is dropped with a diagnostic, never synthesized with a
//! placeholder input: an absent part is always preferable to an invalid
//! one.

pub mod guard;

use std::collections::HashMap;

use serde_json::Value;

use crate::types::{empty_input, ChatMessage, ContentPart, FinishReason, ToolState, TurnEvent, Usage};

struct CallSlot {
    part_index: usize,
    resolved: bool,
}

/// Per-request accumulator. Exclusively owned by one in-flight turn, created
/// when the completion starts, consumed exactly once by [`finalize`], never
/// durable itself.
///
/// [`finalize`]: ReconcileBuffer::finalize
pub struct ReconcileBuffer {
    thread_id: String,
    message_id: String,
    parts: Vec<ContentPart>,
    calls: HashMap<String, CallSlot>,
    text: String,
    finish_reason: Option<FinishReason>,
    usage: Usage,
    error: Option<String>,
}

impl ReconcileBuffer {
    /// Create a buffer for the assistant message `message_id` in `thread_id`.
    pub fn new(thread_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            message_id: message_id.into(),
            parts: Vec::new(),
            calls: HashMap::new(),
            text: String::new(),
            finish_reason: None,
            usage: Usage::default(),
            error: None,
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Feed one event, in emission order.
    pub fn observe(&mut self, event: &TurnEvent) {
        match event {
            TurnEvent::TextDelta { text } => self.text.push_str(text),
            TurnEvent::ToolCallStarted {
                tool_call_id,
                tool_name,
                input,
            } => self.on_call_started(tool_call_id, tool_name, input),
            TurnEvent::ToolCallProgress { tool_call_id, .. } => {
                // Transient: forwarded live, never persisted.
                if !self.calls.contains_key(tool_call_id) {
                    tracing::debug!(
                        thread_id = %self.thread_id,
                        tool_call_id = %tool_call_id,
                        "progress event for unknown tool call"
                    );
                }
            }
            TurnEvent::ToolCallCompleted {
                tool_call_id,
                output,
                is_error,
            } => self.on_call_completed(tool_call_id, output, *is_error),
            TurnEvent::Finished {
                finish_reason,
                usage,
            } => {
                self.finish_reason = Some(*finish_reason);
                self.usage.merge(usage);
            }
            TurnEvent::Failed { error } => {
                self.error = Some(error.clone());
            }
        }
    }

    fn on_call_started(&mut self, tool_call_id: &str, tool_name: &str, input: &Value) {
        if let Some(slot) = self.calls.get(tool_call_id) {
            // Duplicate call id. Keep the first non-empty input the model
            // committed to; a later non-empty input only fills a hole.
            let replace = match &self.parts[slot.part_index] {
                ContentPart::Tool { input: existing, .. } => {
                    empty_input(existing) && !empty_input(input)
                }
                _ => false,
            };
            tracing::warn!(
                thread_id = %self.thread_id,
                tool_call_id = %tool_call_id,
                tool_name = %tool_name,
                reason = "duplicate-call-id",
                "duplicate tool call started"
            );
            if replace {
                if let ContentPart::Tool { input: existing, .. } =
                    &mut self.parts[slot.part_index]
                {
                    *existing = input.clone();
                }
            }
            return;
        }

        // A tool call closes the current text span; later text opens a new
        // part so display interleaving survives persistence.
        self.flush_text();
        let part_index = self.parts.len();
        self.parts
            .push(ContentPart::tool_pending(tool_call_id, tool_name, input.clone()));
        self.calls.insert(
            tool_call_id.to_string(),
            CallSlot {
                part_index,
                resolved: false,
            },
        );
    }

    fn on_call_completed(&mut self, tool_call_id: &str, output: &Value, is_error: bool) {
        let Some(slot) = self.calls.get_mut(tool_call_id) else {
            tracing::warn!(
                thread_id = %self.thread_id,
                tool_call_id = %tool_call_id,
                reason = "orphan-result",
                "dropping tool result with no matching call"
            );
            return;
        };
        if slot.resolved {
            tracing::warn!(
                thread_id = %self.thread_id,
                tool_call_id = %tool_call_id,
                reason = "duplicate-result",
                "dropping duplicate tool result"
            );
            return;
        }

        let ContentPart::Tool {
            tool_name,
            input,
            state,
            output: part_output,
            error_text,
            ..
        } = &mut self.parts[slot.part_index]
        else {
            unreachable!("call slot always indexes a tool part");
        };

        if empty_input(input) {
            // Input was never captured at call time. Persisting this part
            // would violate the message invariant, so it stays pending and
            // is dropped at finalization.
            tracing::warn!(
                thread_id = %self.thread_id,
                tool_call_id = %tool_call_id,
                tool_name = %tool_name,
                reason = "empty-input",
                "dropping tool result whose call has no input"
            );
            slot.resolved = true;
            return;
        }

        *state = if is_error {
            ToolState::OutputError
        } else {
            ToolState::OutputAvailable
        };
        *part_output = Some(output.clone());
        if is_error {
            *error_text = output
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| Some(output.to_string()));
        }
        slot.resolved = true;
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.parts.push(ContentPart::Text {
                text: std::mem::take(&mut self.text),
            });
        }
    }

    /// A point-in-time copy of the accumulated message, used for mid-stream
    /// checkpoint upserts. Includes still-pending tool parts and the open
    /// text span.
    pub fn snapshot(&self) -> ChatMessage {
        let mut message = ChatMessage::assistant(self.message_id.clone(), self.thread_id.clone());
        message.parts = self.parts.clone();
        if !self.text.is_empty() {
            message.parts.push(ContentPart::text(self.text.clone()));
        }
        message.set_metadata("streaming", Value::Bool(true));
        message
    }

    /// Consume the buffer into the final message. Runs on the terminal event
    /// regardless of success or failure: a partial turn persists whatever
    /// was validly accumulated.
    pub fn finalize(mut self) -> ChatMessage {
        self.flush_text();

        let thread_id = self.thread_id.clone();
        self.parts.retain(|part| match part {
            ContentPart::Tool {
                state: ToolState::PendingCall,
                tool_call_id,
                tool_name,
                ..
            } => {
                // Either the result was refused (already diagnosed) or it
                // never arrived before the terminal event.
                tracing::debug!(
                    thread_id = %thread_id,
                    tool_call_id = %tool_call_id,
                    tool_name = %tool_name,
                    "discarding unresolved tool call at finalization"
                );
                false
            }
            _ => true,
        });

        let mut message = ChatMessage::assistant(self.message_id, self.thread_id);
        message.parts = self.parts;
        if let Some(reason) = self.finish_reason {
            message.set_metadata("finishReason", Value::String(reason.to_string()));
        }
        if self.usage != Usage::default() {
            if let Ok(usage) = serde_json::to_value(self.usage) {
                message.set_metadata("usage", usage);
            }
        }
        if let Some(error) = self.error {
            message.set_metadata("partial", Value::Bool(true));
            message.set_metadata("error", Value::String(error));
        }
        message
    }
}
