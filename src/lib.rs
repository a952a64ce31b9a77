//! Tool Analytics
//!
//! Telemetry for tool-serving processes: record tool invocations and errors,
//! persist them to an append-only NDJSON log, and answer analytical queries
//! (metrics, per-tool stats, grouped errors, cost, insights) over that log,
//! per source or across all sources.
//!
//! # Modules
//!
//! - `types`: Record model, query parameters and result views
//! - `collector`: Sampling, batching collector with bounded retry
//! - `sink`: Delivery contract and the durable file sink
//! - `store`: Cached log loader and the query-source contract
//! - `analytics`: Windowing, percentiles and all-sources aggregation
//! - `protocol`: MCP and JSON-RPC protocol types
//! - `server`: Instrumented MCP server over stdio
//! - `tools`: The five analytics MCP tools
//! - `config`: Environment configuration for the binary
//! - `utils`: Time helpers
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tool_analytics::{CollectorConfig, EventCollector, FileSink, Invocation};
//! use tool_analytics::{FileQuerySource, QuerySource, Selector, TimeWindow};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let sink = Arc::new(FileSink::new("data/events.jsonl"));
//! let collector = EventCollector::new(CollectorConfig::new("server-a"), sink)?;
//! collector.record_invocation(Invocation::new("search", serde_json::json!({})).with_duration(12.0));
//! collector.shutdown().await?;
//!
//! let source = FileQuerySource::new("data/events.jsonl");
//! let _metrics = source.metrics(&Selector::All, TimeWindow::OneHour)?;
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod collector;
pub mod config;
pub mod protocol;
pub mod server;
pub mod sink;
pub mod store;
pub mod tools;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use analytics::QueryEngine;
pub use collector::{CollectorConfig, ConfigError, ErrorEvent, EventCollector, Invocation};
pub use config::ServerConfig;
pub use protocol::{McpTool, ServerInfo, Tool};
pub use server::McpServer;
pub use sink::{FileSink, Sink, SinkError};
pub use store::{CachedLoader, FileQuerySource, LoadError, QuerySource};
pub use types::{
    Aggregated, AggregatedInsights, CostEstimate, ErrorLogEntry, ErrorRecord, EventRecord,
    InsightsView, InvocationRecord, McpResult, MetricsView, QueryError, QueryResult, Selector,
    SubjectStats, TimeWindow,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
