//! Incremental response emitter.
//!
//! Drives one model completion to finish, surfacing every meaningful state
//! change as a [`TurnEvent`]. Tool calls are dispatched against the
//! registry as they arrive; each step's results are fed back to the model
//! for a follow-up completion, up to the configured iteration cap.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::WeirConfig;
use crate::error::WeirError;
use crate::model::{ChatModel, ModelEventType, ModelRequest, ToolCallRequest};
use crate::tools::tool::error_payload;
use crate::tools::{ToolContext, ToolInput, ToolRegistry};
use crate::types::{
    empty_input, ChatMessage, ContentPart, FinishReason, ToolState, TurnEvent, Usage,
};

/// Emits the ordered event sequence for one turn.
///
/// The buffer handle is never ambient state: the produced stream is handed
/// to the tee explicitly, so concurrent turns cannot cross-contaminate.
pub struct TurnEmitter {
    model: Arc<dyn ChatModel>,
    registry: Arc<ToolRegistry>,
    config: WeirConfig,
}

impl TurnEmitter {
    pub fn new(model: Arc<dyn ChatModel>, registry: Arc<ToolRegistry>, config: WeirConfig) -> Self {
        Self {
            model,
            registry,
            config,
        }
    }

    /// Produce the event stream for one turn over `prior` messages.
    ///
    /// Guarantees: text deltas in order; `ToolCallStarted` precedes any
    /// progress/completed event for the same id; exactly one terminal event.
    pub fn stream(
        &self,
        thread_id: String,
        prior: Vec<ChatMessage>,
    ) -> BoxStream<'static, TurnEvent> {
        let model = self.model.clone();
        let registry = self.registry.clone();
        let config = self.config.clone();

        Box::pin(async_stream::stream! {
            let mut messages = prior;
            let mut usage_total = Usage::default();
            let tool_defs = registry.definitions();
            let idle_ms = config.stream_idle_timeout_ms;
            let mut step = 0usize;

            loop {
                step += 1;
                if step > config.max_tool_iterations {
                    yield TurnEvent::Failed {
                        error: "tool loop exceeded max iterations".to_string(),
                    };
                    return;
                }

                let request = ModelRequest {
                    messages: messages.clone(),
                    tools: tool_defs.clone(),
                };
                let mut deltas = match model.stream(&request).await {
                    Ok(deltas) => deltas,
                    Err(err) => {
                        yield TurnEvent::Failed { error: err.to_string() };
                        return;
                    }
                };

                let mut step_text = String::new();
                let mut step_calls: Vec<ToolCallRequest> = Vec::new();
                let mut finish_reason = FinishReason::Stop;

                loop {
                    let next = if idle_ms > 0 {
                        match tokio::time::timeout(Duration::from_millis(idle_ms), deltas.next())
                            .await
                        {
                            Ok(next) => next,
                            Err(_) => {
                                yield TurnEvent::Failed {
                                    error: WeirError::Timeout(idle_ms).to_string(),
                                };
                                return;
                            }
                        }
                    } else {
                        deltas.next().await
                    };
                    let Some(delta) = next else { break };

                    match delta {
                        Ok(delta) => match delta.event_type {
                            ModelEventType::TextDelta => {
                                if !delta.text.is_empty() {
                                    step_text.push_str(&delta.text);
                                    yield TurnEvent::TextDelta { text: delta.text };
                                }
                            }
                            ModelEventType::ToolCall => {
                                if let Some(call) = delta.tool_call {
                                    yield TurnEvent::ToolCallStarted {
                                        tool_call_id: call.id.clone(),
                                        tool_name: call.name.clone(),
                                        input: call.input.clone(),
                                    };
                                    step_calls.push(call);
                                }
                            }
                            ModelEventType::Done => {
                                if let Some(reason) = delta.finish_reason {
                                    finish_reason = reason;
                                }
                                if let Some(usage) = delta.usage {
                                    usage_total.merge(&usage);
                                }
                                break;
                            }
                        },
                        Err(err) => {
                            yield TurnEvent::Failed { error: err.to_string() };
                            return;
                        }
                    }
                }

                if step_calls.is_empty() {
                    yield TurnEvent::Finished {
                        finish_reason,
                        usage: usage_total,
                    };
                    return;
                }

                let mut result_parts: Vec<ContentPart> = Vec::new();
                for call in &step_calls {
                    let Some(tool) = registry.get(&call.name) else {
                        tracing::warn!(
                            thread_id = %thread_id,
                            tool_call_id = %call.id,
                            tool_name = %call.name,
                            "model requested unknown tool"
                        );
                        let output = error_payload(&WeirError::ToolNotFound(call.name.clone()));
                        yield TurnEvent::ToolCallCompleted {
                            tool_call_id: call.id.clone(),
                            output: output.clone(),
                            is_error: true,
                        };
                        push_result_part(&mut result_parts, call, output, true);
                        continue;
                    };

                    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<Value>();
                    let ctx = ToolContext {
                        thread_id: thread_id.clone(),
                        tool_call_id: call.id.clone(),
                        progress: Some(progress_tx),
                    };
                    let input = ToolInput::new(call.input.clone());
                    let mut exec =
                        tokio::spawn(async move { tool.execute(&input, &ctx).await });

                    let mut progress_open = true;
                    let outcome = loop {
                        tokio::select! {
                            maybe = progress_rx.recv(), if progress_open => {
                                match maybe {
                                    Some(payload) => {
                                        yield TurnEvent::ToolCallProgress {
                                            tool_call_id: call.id.clone(),
                                            tool_name: call.name.clone(),
                                            payload,
                                        };
                                    }
                                    // Closed channel just means the task is
                                    // done; the other arm picks that up.
                                    None => progress_open = false,
                                }
                            }
                            joined = &mut exec => break joined,
                        }
                    };

                    // Forward progress staged before completion won the race.
                    while let Ok(payload) = progress_rx.try_recv() {
                        yield TurnEvent::ToolCallProgress {
                            tool_call_id: call.id.clone(),
                            tool_name: call.name.clone(),
                            payload,
                        };
                    }

                    let (output, is_error) = match outcome {
                        Ok(Ok(value)) => (value, false),
                        Ok(Err(err)) => (error_payload(&err), true),
                        Err(join_err) => (
                            error_payload(&WeirError::tool(
                                call.name.clone(),
                                format!("tool task aborted: {join_err}"),
                            )),
                            true,
                        ),
                    };

                    yield TurnEvent::ToolCallCompleted {
                        tool_call_id: call.id.clone(),
                        output: output.clone(),
                        is_error,
                    };
                    push_result_part(&mut result_parts, call, output, is_error);
                }

                // One failing tool never aborts the turn; its error result is
                // part of the step message like any other.
                let mut parts: Vec<ContentPart> = Vec::new();
                if !step_text.is_empty() {
                    parts.push(ContentPart::text(step_text));
                }
                parts.extend(result_parts);
                let mut step_message =
                    ChatMessage::assistant(Uuid::new_v4().to_string(), thread_id.clone());
                step_message.parts = parts;
                messages.push(step_message);
            }
        })
    }
}

/// Record a completed call for the follow-up model request. Calls whose
/// input was never captured are excluded entirely (call and result both),
/// matching what the strict provider API will accept.
fn push_result_part(
    parts: &mut Vec<ContentPart>,
    call: &ToolCallRequest,
    output: Value,
    is_error: bool,
) {
    if empty_input(&call.input) {
        tracing::debug!(
            tool_call_id = %call.id,
            tool_name = %call.name,
            "omitting empty-input call from follow-up prompt"
        );
        return;
    }
    parts.push(ContentPart::Tool {
        tool_call_id: call.id.clone(),
        tool_name: call.name.clone(),
        input: call.input.clone(),
        state: if is_error {
            ToolState::OutputError
        } else {
            ToolState::OutputAvailable
        },
        output: Some(output.clone()),
        error_text: is_error
            .then(|| output.get("error").and_then(Value::as_str).map(str::to_string))
            .flatten(),
    });
}
