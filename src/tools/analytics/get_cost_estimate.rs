//! Get cost estimate tool

use std::sync::Arc;

use serde_json::{json, Value};

use super::{json_content, selector_arg, selector_schema, window_arg, window_schema};
use crate::protocol::{McpTool, Tool};
use crate::store::QuerySource;
use crate::types::McpResult;

/// Tool for projecting cost from call volume
pub struct GetCostEstimateTool {
    source: Arc<dyn QuerySource>,
}

impl GetCostEstimateTool {
    pub fn new(source: Arc<dyn QuerySource>) -> Self {
        Self { source }
    }
}

impl Tool for GetCostEstimateTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: "get_cost_estimate".to_string(),
            description: "Estimate cost as call count times a flat per-call cost".to_string(),
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

        let cost = self.source.cost_estimate(&selector, window)?;
        json_content(&cost)
    }
}
