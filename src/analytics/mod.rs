//! Query/aggregation engine
//!
//! Turns a snapshot of log records into the analytical views. Every view can
//! be scoped to one source or computed across all sources, in which case the
//! result carries a per-source breakdown plus the figure over the union.
//!
//! ```text
//! records ──► window filter ──► selector ──┬─ Source(id): view(own records)
//!                                          └─ All: view(each source) + view(union)
//! ```
//!
//! All computation here is synchronous and pure over its input.

mod errors;
mod insights;
mod metrics;
mod percentile;
mod scope;

pub use errors::{group_errors, DEFAULT_ERROR_LOG_LIMIT};
pub use insights::{
    aggregate_insights, insights_from_metrics, CRITICAL_ERROR_RATE, ERROR_SPIKE_RATE,
    SLOW_SUBJECT_MS, VERY_SLOW_SUBJECT_MS,
};
pub use metrics::{
    compute_cost, compute_metrics, compute_subject_stats, top_subjects, TOP_SUBJECTS_LIMIT,
};
pub use percentile::{mean, percentile, sorted_durations};
pub use scope::{errors, invocations_since, partition_by_source, scoped, Sourced};

use crate::types::{
    AggregatedInsights, CostEstimate, ErrorLogEntry, EventRecord, InsightsView, InvocationRecord,
    MetricsView, QueryResult, Selector, SubjectStats, TimeWindow,
};

/// Default cost charged per invocation by the linear cost model
pub const DEFAULT_COST_PER_CALL: f64 = 0.0001;

/// Stateless engine over record snapshots
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine {
    cost_per_call: f64,
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(DEFAULT_COST_PER_CALL)
    }
}

impl QueryEngine {
    pub fn new(cost_per_call: f64) -> Self {
        Self { cost_per_call }
    }

    pub fn metrics(
        &self,
        records: &[EventRecord],
        selector: &Selector,
        window: TimeWindow,
        now_ms: i64,
    ) -> QueryResult<MetricsView> {
        let invocations = invocations_since(records, window.cutoff(now_ms));
        scoped(invocations, selector, compute_metrics)
    }

    pub fn subject_stats(
        &self,
        records: &[EventRecord],
        selector: &Selector,
        subject_name: &str,
        window: TimeWindow,
        now_ms: i64,
    ) -> QueryResult<SubjectStats> {
        // Only this subject's calls decide which sources appear
        let invocations: Vec<&InvocationRecord> = invocations_since(records, window.cutoff(now_ms))
            .into_iter()
            .filter(|r| r.subject_name == subject_name)
            .collect();
        scoped(invocations, selector, |items| {
            compute_subject_stats(items, subject_name)
        })
    }

    /// Grouped errors over the whole log; `limit` applies to each list
    pub fn error_log(
        &self,
        records: &[EventRecord],
        selector: &Selector,
        limit: usize,
    ) -> QueryResult<Vec<ErrorLogEntry>> {
        scoped(errors(records), selector, |items| group_errors(items, limit))
    }

    pub fn cost_estimate(
        &self,
        records: &[EventRecord],
        selector: &Selector,
        window: TimeWindow,
        now_ms: i64,
    ) -> QueryResult<CostEstimate> {
        let cost_per_call = self.cost_per_call;
        let invocations = invocations_since(records, window.cutoff(now_ms));
        scoped(invocations, selector, |items| compute_cost(items, cost_per_call))
    }

    pub fn insights(
        &self,
        records: &[EventRecord],
        selector: &Selector,
        window: TimeWindow,
        now_ms: i64,
    ) -> QueryResult<InsightsView, AggregatedInsights> {
        match self.metrics(records, selector, window, now_ms) {
            QueryResult::Single(metrics) => QueryResult::Single(insights_from_metrics(&metrics)),
            QueryResult::AllSources(metrics) => {
                QueryResult::AllSources(aggregate_insights(&metrics))
            }
        }
    }
}
