//! Get metrics tool

use std::sync::Arc;

use serde_json::{json, Value};

use super::{json_content, selector_arg, selector_schema, window_arg, window_schema};
use crate::protocol::{McpTool, Tool};
use crate::store::QuerySource;
use crate::types::McpResult;

/// Tool for call volume, success rate, latency percentiles and top tools
pub struct GetMetricsTool {
    source: Arc<dyn QuerySource>,
}

impl GetMetricsTool {
    pub fn new(source: Arc<dyn QuerySource>) -> Self {
        Self { source }
    }
}

impl Tool for GetMetricsTool {
    fn definition(&self) -> McpTool {
        McpTool {
            name: "get_metrics".to_string(),
            description: "Get call counts, success/error rate, latency percentiles (p50/p95/p99) and the most-called tools".to_string(),
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

        let metrics = self.source.metrics(&selector, window)?;
        json_content(&metrics)
    }
}
