//! Shared test helpers: scripted model and canned tools.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::json;

use weir::error::Result;
use weir::model::{ChatModel, ModelDelta, ModelRequest};
use weir::tools::{FnTool, Tool, ToolParameters, ToolRegistry};
use weir::types::{FinishReason, Usage};

/// A model that replays scripted delta sequences, one per completion step,
/// and records every request it receives.
pub struct ScriptedModel {
    steps: Mutex<VecDeque<Vec<Result<ModelDelta>>>>,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue one completion step.
    pub fn push_step(&self, deltas: Vec<ModelDelta>) {
        self.steps
            .lock()
            .unwrap()
            .push_back(deltas.into_iter().map(Ok).collect());
    }

    /// Queue one completion step with explicit results (for error injection).
    pub fn push_step_raw(&self, deltas: Vec<Result<ModelDelta>>) {
        self.steps.lock().unwrap().push_back(deltas);
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn stream(
        &self,
        request: &ModelRequest,
    ) -> Result<BoxStream<'static, Result<ModelDelta>>> {
        self.requests.lock().unwrap().push(request.clone());
        let deltas = self.steps.lock().unwrap().pop_front().unwrap_or_else(|| {
            vec![Ok(ModelDelta::done(FinishReason::Stop, Usage::default()))]
        });
        Ok(Box::pin(futures::stream::iter(deltas)))
    }
}

/// A model whose stream never yields. For idle-timeout tests.
pub struct StalledModel;

#[async_trait]
impl ChatModel for StalledModel {
    fn model_id(&self) -> &str {
        "stalled"
    }

    async fn stream(
        &self,
        _request: &ModelRequest,
    ) -> Result<BoxStream<'static, Result<ModelDelta>>> {
        Ok(Box::pin(futures::stream::pending()))
    }
}

pub fn done() -> ModelDelta {
    ModelDelta::done(
        FinishReason::Stop,
        Usage {
            input_tokens: 10,
            output_tokens: 20,
            total_tokens: 30,
        },
    )
}

/// Tool returning `{"result": "y"}` for any query.
pub fn lookup_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "lookup",
        "Look something up",
        ToolParameters::new().string("query", "Search query", true),
        |_input, _ctx| async { Ok(json!({"result": "y"})) },
    ))
}

/// Tool that always fails.
pub fn failing_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "explode",
        "Always fails",
        ToolParameters::new(),
        |_input, _ctx| async {
            Err(weir::error::WeirError::tool("explode", "boom"))
        },
    ))
}

/// Progressive tool that stages two progress payloads before finishing.
pub fn progress_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new(
        "render",
        "Renders in stages",
        ToolParameters::new().string("chart", "Chart layout", true),
        |_input, ctx| async move {
            ctx.report_progress(json!({"pct": 50}));
            ctx.report_progress(json!({"pct": 100}));
            Ok(json!({"done": true}))
        },
    ))
}

pub fn registry_with(tools: Vec<Arc<dyn Tool>>) -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool);
    }
    Arc::new(registry)
}
