//! Get tool stats tool

use std::sync::Arc;

use serde_json::{json, Value};

use super::{json_content, selector_arg, selector_schema, window_arg, window_schema};
use crate::protocol::{McpTool, Tool};
use crate::store::QuerySource;
use crate::types::{McpResult, QueryError};

/// Tool for statistics of a single tool
pub struct GetToolStatsTool {
    source: Arc<dyn QuerySource>,
}

impl GetToolStatsTool {
    pub fn new(source: Arc<dyn QuerySource>) -> Self {
        Self { source }
    }
}

impl Tool for GetToolStatsTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: "get_tool_stats".to_string(),
            description: "Get call, success and error counts plus latency percentiles for one tool".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "toolName": {
                        "type": "string",
                        "description": "Name of the tool to analyze"
                    },
                    "selector": selector_schema(),
                    "window": window_schema()
                },
                "required": ["toolName"]
            }),
        }
    }

    fn execute(&self, params: Value) -> McpResult<Value> {
        let tool_name = params
            .get("toolName")
            .and_then(|v| v.as_str())
            .ok_or(QueryError::MissingArgument("toolName"))?;
        let selector = selector_arg(&params)?;
        let window = window_arg(&params)?;

        let stats = self.source.subject_stats(&selector, tool_name, window)?;
        json_content(&stats)
    }
}
