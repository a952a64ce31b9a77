//! Get error log tool

use std::sync::Arc;

use serde_json::{json, Value};

use super::{json_content, limit_arg, selector_arg, selector_schema};
use crate::analytics::DEFAULT_ERROR_LOG_LIMIT;
use crate::protocol::{McpTool, Tool};
use crate::store::QuerySource;
use crate::types::McpResult;

/// Tool for recent errors grouped by category and message
pub struct GetErrorLogTool {
    source: Arc<dyn QuerySource>,
}

impl GetErrorLogTool {
    pub fn new(source: Arc<dyn QuerySource>) -> Self {
        Self { source }
    }
}

impl Tool for GetErrorLogTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: "get_error_log".to_string(),
            description: "Get errors grouped by (category, message), most frequent first".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "selector": selector_schema(),
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "default": DEFAULT_ERROR_LOG_LIMIT,
                        "description": "Maximum number of error groups to return"
                    }
                },
                "required": []
            }),
        }
    }

    fn execute(&self, params: Value) -> McpResult<Value> {
        let selector = selector_arg(&params)?;
        let limit = limit_arg(&params, DEFAULT_ERROR_LOG_LIMIT)?;

        let errors = self.source.error_log(&selector, limit)?;
        json_content(&errors)
    }
}
