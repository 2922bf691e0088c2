//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::input::ToolInput;
use super::types::ToolParameters;
use crate::error::{Result, WeirError};

/// Context available during tool execution.
///
/// `progress` lets progressive tools stage intermediate payloads; the
/// emitter forwards each one as a `ToolCallProgress` event. Progress values
/// are transient; only the final result is ever persisted.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub thread_id: String,
    pub tool_call_id: String,
    pub progress: Option<mpsc::UnboundedSender<Value>>,
}

impl ToolContext {
    /// Stage a progress payload. Silently ignored if nobody is listening.
    pub fn report_progress(&self, payload: Value) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(payload);
        }
    }
}

/// Core tool trait. Implement to create custom capabilities.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &ToolParameters;

    /// Execute the tool. Each invocation is independent; implementations
    /// must be safe for concurrent calls.
    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<Value>;
}

type ToolHandler = dyn Fn(ToolInput, ToolContext) -> Pin<Box<dyn Future<Output = Result<Value>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct FnTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolInput, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |input, ctx| Box::pin(handler(input, ctx))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, input: &ToolInput, ctx: &ToolContext) -> Result<Value> {
        (self.handler)(input.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for FnTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// Map a tool failure to the error payload recorded in its result.
pub(crate) fn error_payload(error: &WeirError) -> Value {
    serde_json::json!({ "error": error.to_string() })
}
