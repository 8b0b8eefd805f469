//! Tool-related types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arguments of a tool call, keyed by parameter name.
pub type ToolInput = Map<String, Value>;

/// A tool as advertised by the host.
///
/// The schema is whatever the host sent; nothing here assumes its shape
/// beyond the optional `required` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Parameter names listed under the schema's `required` key.
    pub fn required_fields(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl From<mcp::Tool> for ToolDescriptor {
    fn from(tool: mcp::Tool) -> Self {
        Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            input_schema: tool.input_schema,
        }
    }
}

/// A tool invocation produced from a model completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub input: ToolInput,
}

/// Raw textual payload returned by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
}

impl ToolResult {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}
