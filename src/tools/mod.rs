//! MCP Tools implementation
//!
//! This module contains the 5 analytics tools:
//! - get_metrics, get_tool_stats, get_error_log, get_cost_estimate, get_insights

pub mod analytics;

use std::sync::Arc;

use crate::server::McpServer;
use crate::store::QuerySource;

// Re-export all tools for convenience
pub use analytics::{
    GetCostEstimateTool, GetErrorLogTool, GetInsightsTool, GetMetricsTool, GetToolStatsTool,
};

/// Register all tools with the MCP server
pub fn register_all_tools(server: &mut McpServer, source: Arc<dyn QuerySource>) {
    server.register_tool(Box::new(GetMetricsTool::new(source.clone())));
    server.register_tool(Box::new(GetToolStatsTool::new(source.clone())));
    server.register_tool(Box::new(GetErrorLogTool::new(source.clone())));
    server.register_tool(Box::new(GetCostEstimateTool::new(source.clone())));
    server.register_tool(Box::new(GetInsightsTool::new(source)));
}
