//! Typed access to tool call arguments.

use serde_json::Value;

use super::validation::FieldErrors;
use crate::error::SleuthError;

/// Wrapper around validated tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// Parse the raw payload a model produced. An empty payload is `{}`.
    pub fn parse_raw(raw: &str) -> Result<Value, FieldErrors> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(serde_json::json!({}));
        }
        serde_json::from_str::<Value>(trimmed)
            .map_err(|e| FieldErrors::payload(format!("arguments are not valid JSON: {e}")))
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, SleuthError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SleuthError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, SleuthError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| SleuthError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    /// Get a list of strings.
    pub fn get_str_list(&self, key: &str) -> Result<Vec<&str>, SleuthError> {
        self.value
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
            .ok_or_else(|| SleuthError::InvalidArgument(format!("Missing array argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, SleuthError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            SleuthError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
