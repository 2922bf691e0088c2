//! Upstream model abstraction.
//!
//! Weir is vendor-independent: the engine only sees [`ChatModel`], a trait
//! that streams [`ModelDelta`]s for one completion request. Wire-format
//! assembly (SSE parsing, argument-chunk accumulation) is the adapter's
//! concern: by the time a delta reaches the engine, a tool call carries its
//! complete input.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::{ChatMessage, FinishReason, Usage};

/// Tool definition advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's input.
    pub parameters: Value,
}

/// One completion request.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Prior conversation, oldest first. Assistant messages carry completed
    /// tool parts (input + output), which the adapter replays as the
    /// provider's call/result pairs.
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

/// A complete tool invocation request surfaced by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub input: Value,
}

/// What kind of delta this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelEventType {
    TextDelta,
    ToolCall,
    Done,
}

/// A delta emitted while the model streams.
#[derive(Debug, Clone)]
pub struct ModelDelta {
    pub event_type: ModelEventType,
    /// Incremental text (for `TextDelta`).
    pub text: String,
    /// Complete tool call (for `ToolCall`).
    pub tool_call: Option<ToolCallRequest>,
    /// Finish reason (on `Done`).
    pub finish_reason: Option<FinishReason>,
    /// Usage (typically on `Done`).
    pub usage: Option<Usage>,
}

impl ModelDelta {
    /// A text delta.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            event_type: ModelEventType::TextDelta,
            text: text.into(),
            tool_call: None,
            finish_reason: None,
            usage: None,
        }
    }

    /// A complete tool call.
    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            event_type: ModelEventType::ToolCall,
            text: String::new(),
            tool_call: Some(ToolCallRequest {
                id: id.into(),
                name: name.into(),
                input,
            }),
            finish_reason: None,
            usage: None,
        }
    }

    /// The terminal delta for one completion.
    pub fn done(finish_reason: FinishReason, usage: Usage) -> Self {
        Self {
            event_type: ModelEventType::Done,
            text: String::new(),
            tool_call: None,
            finish_reason: Some(finish_reason),
            usage: Some(usage),
        }
    }
}

/// Core trait implemented by model adapters.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// The model id this instance serves (for diagnostics).
    fn model_id(&self) -> &str;

    /// Start one streaming completion.
    async fn stream(
        &self,
        request: &ModelRequest,
    ) -> Result<BoxStream<'static, Result<ModelDelta>>>;
}
