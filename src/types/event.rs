//! Turn event stream types.
//!
//! One [`TurnEvent`] sequence is the public record of a turn: the live
//! client transport and the reconciliation buffer both consume it, and it is
//! the sole source of truth for what gets persisted; no internal provider
//! transcript is ever consulted.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::usage::Usage;

/// Why a completion finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other,
}

/// A typed event emitted while a turn executes.
///
/// Ordering guarantees: text deltas arrive in order; `ToolCallStarted` for a
/// given `tool_call_id` precedes any progress/completed event for that id;
/// exactly one terminal event (`Finished` or `Failed`) ends the sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TurnEvent {
    /// Incremental assistant text.
    TextDelta { text: String },

    /// The model requested a tool invocation; `input` is the complete
    /// captured argument value.
    ToolCallStarted {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        input: Value,
    },

    /// A progress notification from a still-running tool. Forwarded live,
    /// never persisted.
    ToolCallProgress {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        payload: Value,
    },

    /// A tool produced its final result (or failed).
    ToolCallCompleted {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        output: Value,
        #[serde(rename = "isError", default)]
        is_error: bool,
    },

    /// Terminal: the turn completed.
    Finished {
        #[serde(rename = "finishReason")]
        finish_reason: FinishReason,
        usage: Usage,
    },

    /// Terminal: the turn failed mid-stream. Accumulated partial state is
    /// still finalized and persisted.
    Failed { error: String },
}

impl TurnEvent {
    /// Whether this event ends the sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_kebab_case_tags() {
        let event = TurnEvent::ToolCallStarted {
            tool_call_id: "c1".into(),
            tool_name: "lookup".into(),
            input: json!({"query": "x"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "tool-call-started");
        assert_eq!(value["toolCallId"], "c1");

        let event = TurnEvent::Finished {
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "finished");
        assert_eq!(value["finishReason"], "stop");
    }

    #[test]
    fn terminal_classification() {
        assert!(TurnEvent::Failed { error: "x".into() }.is_terminal());
        assert!(!TurnEvent::TextDelta { text: "hi".into() }.is_terminal());
    }
}
