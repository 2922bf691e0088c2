//! Tool capability registry.

use std::collections::HashMap;
use std::sync::Arc;

use super::tool::Tool;
use crate::model::ToolDefinition;

/// Lookup from tool name to executable capability.
///
/// Read-only once built and shared across concurrent turns via `Arc`; each
/// invocation is independent.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A later registration under the same name replaces
    /// the earlier one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Definitions advertised to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters().schema(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool::FnTool;
    use crate::tools::types::ToolParameters;

    fn noop_tool(name: &str) -> Arc<dyn Tool> {
        Arc::new(FnTool::new(
            name,
            "noop",
            ToolParameters::new(),
            |_input, _ctx| async { Ok(serde_json::json!({"ok": true})) },
        ))
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(noop_tool("lookup"));
        registry.register(noop_tool("render"));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("lookup").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn definitions_are_sorted_by_name() {
        let mut registry = ToolRegistry::new();
        registry.register(noop_tool("zeta"));
        registry.register(noop_tool("alpha"));

        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn reregistration_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(noop_tool("lookup"));
        registry.register(noop_tool("lookup"));
        assert_eq!(registry.len(), 1);
    }
}
