//! Typed access to tool input values.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, WeirError};

/// Wrapper around a tool's structured input.
#[derive(Debug, Clone)]
pub struct ToolInput {
    value: Value,
}

impl ToolInput {
    /// Wrap a raw JSON value.
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The raw value.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// Get a required string field.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.value[key]
            .as_str()
            .ok_or_else(|| WeirError::InvalidState(format!("missing string field '{key}'")))
    }

    /// Get an optional string field.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value[key].as_str()
    }

    /// Get a required integer field.
    pub fn get_i64(&self, key: &str) -> Result<i64> {
        self.value[key]
            .as_i64()
            .ok_or_else(|| WeirError::InvalidState(format!("missing integer field '{key}'")))
    }

    /// Get a required boolean field.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.value[key]
            .as_bool()
            .ok_or_else(|| WeirError::InvalidState(format!("missing boolean field '{key}'")))
    }

    /// Deserialize the whole input into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.value.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_accessors() {
        let input = ToolInput::new(json!({"name": "Alice", "count": 3, "active": true}));
        assert_eq!(input.get_str("name").unwrap(), "Alice");
        assert_eq!(input.get_i64("count").unwrap(), 3);
        assert!(input.get_bool("active").unwrap());
        assert!(input.get_str("missing").is_err());
        assert_eq!(input.get_str_opt("missing"), None);
    }

    #[test]
    fn deserialize_into_struct() {
        #[derive(serde::Deserialize)]
        struct Params {
            query: String,
            limit: Option<u32>,
        }
        let input = ToolInput::new(json!({"query": "rust", "limit": 10}));
        let params: Params = input.deserialize().unwrap();
        assert_eq!(params.query, "rust");
        assert_eq!(params.limit, Some(10));
    }
}
