//! Get insights tool

use std::sync::Arc;

use serde_json::{json, Value};

use super::{json_content, selector_arg, selector_schema, window_arg, window_schema};
use crate::protocol::{McpTool, Tool};
use crate::store::QuerySource;
use crate::types::McpResult;

/// Tool for slow-tool and error-spike findings with a health score
pub struct GetInsightsTool {
    source: Arc<dyn QuerySource>,
}

impl GetInsightsTool {
    pub fn new(source: Arc<dyn QuerySource>) -> Self {
        Self { source }
    }
}

impl Tool for GetInsightsTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: "get_insights".to_string(),
            description: "Get performance insights (slow tools, error spikes) and a health score; with 'all', high and critical findings are collected across sources".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "selector": selector_schema(),
                    "window": window_schema()
                },
                "required": []
            }),
        }
    }

    fn execute(&self, params: Value) -> McpResult<Value> {
        let selector = selector_arg(&params)?;
        let window = window_arg(&params)?;

        let insights = self.source.insights(&selector, window)?;
        json_content(&insights)
    }
}
