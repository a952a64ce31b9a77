//! Data types for the Tool Analytics server
//!
//! This module contains the log record model, query parameters and the
//! analytical views produced by the query engine.

mod query;
mod record;
mod view;

pub use query::{QueryError, Selector, TimeWindow};
pub use record::{
    ErrorRecord, EventRecord, InvocationRecord, SUBJECT_METADATA_KEY, UNKNOWN_SUBJECT,
};
pub use view::{
    Aggregated, AggregatedInsights, CostEstimate, ErrorLogEntry, Insight, InsightKind,
    InsightsView, MetricsView, Percentiles, QueryResult, Severity, SourceInsight, SubjectStats,
    SubjectSummary,
};

/// Result type for MCP operations
pub type McpResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;
