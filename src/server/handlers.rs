//! Request helpers for the MCP server
//!
//! Argument extraction, content wrapping and the classification of failed
//! tool calls used when instrumenting them.

use serde_json::{json, Map, Value};

/// Error category recorded when `tools/call` names an unregistered tool
pub const UNKNOWN_TOOL_CATEGORY: &str = "UnknownTool";

/// Error category recorded when a registered tool returns an error
pub const TOOL_EXECUTION_CATEGORY: &str = "ToolExecutionError";

/// Extract tool arguments from params
pub fn extract_arguments(params: &Value) -> Value {
    params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()))
}

/// Extract tool name from params
pub fn extract_tool_name(params: &Value) -> Option<&str> {
    params.get("name").and_then(|v| v.as_str())
}

/// Build a text content response
pub fn text_response(text: String) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": text
        }]
    })
}

/// Why a tools/call did not produce a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    UnknownTool,
    Execution(String),
}

impl CallFailure {
    pub fn category(&self) -> &'static str {
        match self {
            CallFailure::UnknownTool => UNKNOWN_TOOL_CATEGORY,
            CallFailure::Execution(_) => TOOL_EXECUTION_CATEGORY,
        }
    }

    pub fn message(&self, tool_name: &str) -> String {
        match self {
            CallFailure::UnknownTool => format!("unknown tool '{}'", tool_name),
            CallFailure::Execution(details) => details.clone(),
        }
    }
}
