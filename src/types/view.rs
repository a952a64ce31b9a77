//! Analytical views returned by query sources

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Latency distribution summary (nearest-rank, floor-indexed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Call count and mean latency of one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectSummary {
    pub subject_name: String,
    pub calls: u64,
    pub avg_duration: f64,
}

/// Overall invocation metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsView {
    pub total_calls: u64,
    pub success_rate: f64,
    pub error_rate: f64,
    pub avg_duration: f64,
    #[serde(flatten)]
    pub percentiles: Percentiles,
    pub top_subjects: Vec<SubjectSummary>,
}

/// Metrics restricted to one tool
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub subject_name: String,
    pub total_calls: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub avg_duration: f64,
    #[serde(flatten)]
    pub percentiles: Percentiles,
}

/// One group of identical (category, message) errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    /// Identifier of the most recent occurrence
    pub id: String,
    pub timestamp: i64,
    pub source_id: String,
    pub error_category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    pub subject_name: String,
    pub frequency: u64,
}

/// Linear cost projection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub total_calls: u64,
    pub cost_per_call: f64,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// High and critical findings are escalated across sources
    pub fn is_escalated(self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    SlowSubject,
    ErrorSpike,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    pub message: String,
    /// The measurement that triggered the insight (ms or ratio)
    pub value: f64,
}

/// Heuristic health findings for one scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsView {
    pub insights: Vec<Insight>,
    pub health_score: f64,
}

impl Default for InsightsView {
    fn default() -> Self {
        Self {
            insights: Vec::new(),
            health_score: 1.0,
        }
    }
}

/// An escalated insight tagged with the source that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInsight {
    pub source_id: String,
    #[serde(flatten)]
    pub insight: Insight,
}

/// Cross-source insight report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedInsights {
    pub by_source: BTreeMap<String, InsightsView>,
    pub critical_insights: Vec<SourceInsight>,
    /// Unweighted mean of per-source health scores
    pub overall_health_score: f64,
}

/// A view computed per source plus once over the union of sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregated<T> {
    pub combined: T,
    pub by_source: BTreeMap<String, T>,
}

/// Result of a query: a single scope, or an all-sources breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResult<T, A = Aggregated<T>> {
    Single(T),
    AllSources(A),
}

impl<T, A> QueryResult<T, A> {
    pub fn single(&self) -> Option<&T> {
        match self {
            QueryResult::Single(view) => Some(view),
            QueryResult::AllSources(_) => None,
        }
    }

    pub fn all_sources(&self) -> Option<&A> {
        match self {
            QueryResult::AllSources(aggregate) => Some(aggregate),
            QueryResult::Single(_) => None,
        }
    }
}
