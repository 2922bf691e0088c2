//! Message and content-part types.
//!
//! A [`ChatMessage`] is the durable representation of one conversation turn
//! side. Its `parts` sequence is append-only while the owning turn streams
//! and frozen once the final upsert lands; mid-stream checkpoints re-upsert
//! the same message id with replaced parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Conversation role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Lifecycle state of a tool invocation part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ToolState {
    /// Call observed, no result yet. Only valid while streaming.
    PendingCall,
    /// Execution completed with output.
    OutputAvailable,
    /// Execution failed; `output` carries the error payload.
    OutputError,
}

/// A single part of message content.
///
/// Invariant: a `Tool` part in `OutputAvailable` or `OutputError` state must
/// have a non-empty, non-null `input`. The strictest downstream provider API
/// rejects tool-result blocks whose originating call lacks recorded input,
/// so violating this corrupts the whole conversation's replayability.
/// [`crate::reconcile::guard::guard_message`] enforces it before every write.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentPart {
    Text {
        text: String,
    },
    Tool {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        input: Value,
        state: ToolState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
        #[serde(rename = "errorText", default, skip_serializing_if = "Option::is_none")]
        error_text: Option<String>,
    },
}

impl ContentPart {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a tool part awaiting its result.
    pub fn tool_pending(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        input: Value,
    ) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            input,
            state: ToolState::PendingCall,
            output: None,
            error_text: None,
        }
    }
}

/// Whether a tool input counts as empty for the message invariant.
///
/// Null, a zero-key object, and a blank string are all "empty": each is a
/// shape observed when call arguments were never actually captured.
pub fn empty_input(input: &Value) -> bool {
    match input {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// A message in a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
    pub role: Role,
    pub parts: Vec<ContentPart>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, Value>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a user message with one text part.
    pub fn user(thread_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thread_id: thread_id.into(),
            role: Role::User,
            parts: vec![ContentPart::text(text)],
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Create an empty assistant message with a fixed id.
    pub fn assistant(id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            thread_id: thread_id.into(),
            role: Role::Assistant,
            parts: Vec::new(),
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
        }
    }

    /// Extract the text content, concatenating all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Iterate over tool parts.
    pub fn tool_parts(&self) -> impl Iterator<Item = &ContentPart> {
        self.parts
            .iter()
            .filter(|part| matches!(part, ContentPart::Tool { .. }))
    }

    /// Set a metadata entry.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }
}

/// A conversation thread. Created lazily on first message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thread {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Thread {
    /// Create a thread owned by `user_id` with a fresh id.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_input_classification() {
        assert!(empty_input(&Value::Null));
        assert!(empty_input(&json!({})));
        assert!(empty_input(&json!("  ")));
        assert!(!empty_input(&json!({"query": "x"})));
        assert!(!empty_input(&json!([1, 2])));
        assert!(!empty_input(&json!(0)));
    }

    #[test]
    fn tool_part_serializes_with_kind_tag() {
        let part = ContentPart::tool_pending("call_1", "lookup", json!({"query": "x"}));
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value["kind"], "tool");
        assert_eq!(value["toolCallId"], "call_1");
        assert_eq!(value["state"], "pending-call");
        assert!(value.get("output").is_none());
    }

    #[test]
    fn message_text_concatenates_parts() {
        let mut message = ChatMessage::assistant("m1", "t1");
        message.parts.push(ContentPart::text("Hello"));
        message
            .parts
            .push(ContentPart::tool_pending("c1", "lookup", json!({"q": 1})));
        message.parts.push(ContentPart::text(" world"));
        assert_eq!(message.text(), "Hello world");
        assert_eq!(message.tool_parts().count(), 1);
    }
}
