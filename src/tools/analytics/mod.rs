//! Analytics tools
//!
//! This module contains 5 tools exposing the query-source contract.

mod get_cost_estimate;
mod get_error_log;
mod get_insights;
mod get_metrics;
mod get_tool_stats;

pub use get_cost_estimate::GetCostEstimateTool;
pub use get_error_log::GetErrorLogTool;
pub use get_insights::GetInsightsTool;
pub use get_metrics::GetMetricsTool;
pub use get_tool_stats::GetToolStatsTool;

use serde::Serialize;
use serde_json::{json, Value};

use crate::server::text_response;
use crate::types::{McpResult, QueryError, Selector, TimeWindow};

/// `selector` argument; defaults to all sources
pub(crate) fn selector_arg(params: &Value) -> Result<Selector, QueryError> {
    match params.get("selector") {
        None | Some(Value::Null) => Ok(Selector::All),
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(QueryError::InvalidSelector(format!(
            "expected a string, got {}",
            other
        ))),
    }
}

/// `window` argument; defaults to 1h
pub(crate) fn window_arg(params: &Value) -> Result<TimeWindow, QueryError> {
    match params.get("window") {
        None | Some(Value::Null) => Ok(TimeWindow::default()),
        Some(Value::String(s)) => s.parse(),
        Some(other) => Err(QueryError::UnknownWindow(other.to_string())),
    }
}

/// `limit` argument: a positive integer, defaulting to `default`
pub(crate) fn limit_arg(params: &Value, default: usize) -> Result<usize, QueryError> {
    match params.get("limit") {
        None | Some(Value::Null) => Ok(default),
        Some(value) => match value.as_u64() {
            Some(limit) if limit > 0 => Ok(limit as usize),
            _ => Err(QueryError::InvalidArgument {
                name: "limit",
                reason: format!("expected a positive integer, got {}", value),
            }),
        },
    }
}

pub(crate) fn selector_schema() -> Value {
    json!({
        "type": "string",
        "default": "all",
        "description": "Source id to query, or 'all' to aggregate across every source"
    })
}

pub(crate) fn window_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["5m", "1h", "24h", "7d", "30d"],
        "default": "1h",
        "description": "Lookback window"
    })
}

/// Wrap a view as MCP text content
pub(crate) fn json_content<T: Serialize>(view: &T) -> McpResult<Value> {
    Ok(text_response(serde_json::to_string_pretty(view)?))
}
