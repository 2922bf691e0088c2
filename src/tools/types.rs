//! Tool parameter schemas.

use serde_json::{json, Map, Value};

/// Input schema advertised for a tool.
///
/// Engine tools describe a flat object of typed fields through the chained
/// methods below; the JSON Schema itself is only rendered when a
/// [`ToolDefinition`](crate::model::ToolDefinition) is built. Tools with a
/// richer shape supply a prebuilt schema via [`from_schema`].
///
/// [`from_schema`]: ToolParameters::from_schema
#[derive(Debug, Clone, Default)]
pub struct ToolParameters {
    raw: Option<Value>,
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ToolParameters {
    /// An object schema with no fields (yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a prebuilt JSON Schema, bypassing the field methods.
    pub fn from_schema(schema: Value) -> Self {
        Self {
            raw: Some(schema),
            ..Self::default()
        }
    }

    /// Add a string field.
    pub fn string(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.field("string", name.into(), description.into(), required)
    }

    /// Add a number field.
    pub fn number(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.field("number", name.into(), description.into(), required)
    }

    /// Add a boolean field.
    pub fn boolean(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        self.field("boolean", name.into(), description.into(), required)
    }

    fn field(mut self, kind: &str, name: String, description: String, required: bool) -> Self {
        self.properties.insert(
            name.clone(),
            json!({ "type": kind, "description": description }),
        );
        if required {
            self.required.push(name);
        }
        self
    }

    /// Render the JSON Schema value sent with the tool definition.
    pub fn schema(&self) -> Value {
        if let Some(schema) = &self.raw {
            return schema.clone();
        }
        json!({
            "type": "object",
            "properties": self.properties.clone(),
            "required": self.required.clone(),
        })
    }
}
