//! Tool-related types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A function call after its arguments were decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Always a JSON object.
    pub input: Value,
}

impl ToolCall {
    /// String argument `key`, or `""` when absent or not a string.
    pub fn str_arg(&self, key: &str) -> &str {
        self.input.get(key).and_then(Value::as_str).unwrap_or_default()
    }
}
