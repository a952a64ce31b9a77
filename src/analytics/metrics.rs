//! Invocation metrics, per-tool stats and cost projection

use std::collections::HashMap;

use super::percentile::{mean, sorted_durations};
use crate::types::{CostEstimate, InvocationRecord, MetricsView, Percentiles, SubjectStats, SubjectSummary};

/// Number of tools kept in the top-subjects ranking
pub const TOP_SUBJECTS_LIMIT: usize = 10;

/// Success ratio; 0 for no calls
fn success_rate(successes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        successes as f64 / total as f64
    }
}

pub fn compute_metrics(invocations: &[&InvocationRecord]) -> MetricsView {
    let total_calls = invocations.len() as u64;
    let successes = invocations.iter().filter(|r| r.success).count() as u64;
    let success_rate = success_rate(successes, total_calls);
    // An empty scope has no errors either
    let error_rate = if total_calls == 0 { 0.0 } else { 1.0 - success_rate };

    let durations = sorted_durations(invocations.iter().filter_map(|r| r.duration));

    MetricsView {
        total_calls,
        success_rate,
        error_rate,
        avg_duration: mean(&durations),
        percentiles: Percentiles::from_sorted(&durations),
        top_subjects: top_subjects(invocations, TOP_SUBJECTS_LIMIT),
    }
}

/// Tools ranked by call count (ties by name), with mean duration
pub fn top_subjects(invocations: &[&InvocationRecord], limit: usize) -> Vec<SubjectSummary> {
    #[derive(Default)]
    struct Tally {
        calls: u64,
        duration_sum: f64,
        timed_calls: u64,
    }

    let mut tallies: HashMap<&str, Tally> = HashMap::new();
    for record in invocations {
        let tally = tallies.entry(record.subject_name.as_str()).or_default();
        tally.calls += 1;
        if let Some(duration) = record.duration.filter(|d| !d.is_nan()) {
            tally.duration_sum += duration;
            tally.timed_calls += 1;
        }
    }

    let mut ranked: Vec<SubjectSummary> = tallies
        .into_iter()
        .map(|(name, tally)| SubjectSummary {
            subject_name: name.to_string(),
            calls: tally.calls,
            avg_duration: if tally.timed_calls == 0 {
                0.0
            } else {
                tally.duration_sum / tally.timed_calls as f64
            },
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.calls
            .cmp(&a.calls)
            .then_with(|| a.subject_name.cmp(&b.subject_name))
    });
    ranked.truncate(limit);
    ranked
}

/// Stats for one tool; `invocations` may contain other tools
pub fn compute_subject_stats(invocations: &[&InvocationRecord], subject_name: &str) -> SubjectStats {
    let matching: Vec<&InvocationRecord> = invocations
        .iter()
        .copied()
        .filter(|r| r.subject_name == subject_name)
        .collect();

    let total_calls = matching.len() as u64;
    let success_count = matching.iter().filter(|r| r.success).count() as u64;
    let durations = sorted_durations(matching.iter().filter_map(|r| r.duration));

    SubjectStats {
        subject_name: subject_name.to_string(),
        total_calls,
        success_count,
        error_count: total_calls - success_count,
        avg_duration: mean(&durations),
        percentiles: Percentiles::from_sorted(&durations),
    }
}

/// Flat per-call cost model
pub fn compute_cost(invocations: &[&InvocationRecord], cost_per_call: f64) -> CostEstimate {
    let total_calls = invocations.len() as u64;
    CostEstimate {
        total_calls,
        cost_per_call,
        estimated_cost: total_calls as f64 * cost_per_call,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inv(subject: &str, success: bool, duration: Option<f64>) -> InvocationRecord {
        InvocationRecord {
            id: String::new(),
            timestamp: 0,
            source_id: "s".to_string(),
            subject_name: subject.to_string(),
            parameters: json!({}),
            duration,
            success,
            failure_detail: None,
            metadata: None,
        }
    }

    #[test]
    fn test_empty_metrics_are_zero() {
        let view = compute_metrics(&[]);
        assert_eq!(view, MetricsView::default());
        assert_eq!(view.error_rate, 0.0);
    }

    #[test]
    fn test_metrics_basic() {
        let records = vec![
            inv("a", true, Some(50.0)),
            inv("a", true, Some(300.0)),
            inv("b", false, Some(100.0)),
            inv("b", true, Some(200.0)),
        ];
        let refs: Vec<&InvocationRecord> = records.iter().collect();
        let view = compute_metrics(&refs);

        assert_eq!(view.total_calls, 4);
        assert_eq!(view.success_rate, 0.75);
        assert_eq!(view.error_rate, 0.25);
        assert_eq!(view.avg_duration, 162.5);
        assert_eq!(view.percentiles.p50, 200.0);
        assert_eq!(view.percentiles.p95, 300.0);
        assert_eq!(view.percentiles.p99, 300.0);
    }

    #[test]
    fn test_records_without_duration_excluded_from_average() {
        let records = vec![inv("a", true, Some(100.0)), inv("a", true, None)];
        let refs: Vec<&InvocationRecord> = records.iter().collect();
        let view = compute_metrics(&refs);

        assert_eq!(view.total_calls, 2);
        assert_eq!(view.avg_duration, 100.0);
        assert_eq!(view.top_subjects[0].avg_duration, 100.0);
    }

    #[test]
    fn test_top_subjects_ranking_and_truncation() {
        let mut records = Vec::new();
        for i in 0..12 {
            for _ in 0..=i {
                records.push(inv(&format!("tool_{:02}", i), true, Some(10.0)));
            }
        }
        records.push(inv("tool_aa", true, Some(10.0)));
        let refs: Vec<&InvocationRecord> = records.iter().collect();

        let top = top_subjects(&refs, TOP_SUBJECTS_LIMIT);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].subject_name, "tool_11");
        assert_eq!(top[0].calls, 12);
        assert!(top.windows(2).all(|w| w[0].calls >= w[1].calls));
    }

    #[test]
    fn test_top_subjects_ties_by_name() {
        let records = vec![inv("zeta", true, None), inv("alpha", true, None)];
        let refs: Vec<&InvocationRecord> = records.iter().collect();
        let top = top_subjects(&refs, 10);
        assert_eq!(top[0].subject_name, "alpha");
        assert_eq!(top[1].subject_name, "zeta");
    }

    #[test]
    fn test_subject_stats() {
        let records = vec![
            inv("search", true, Some(50.0)),
            inv("search", false, Some(100.0)),
            inv("search", true, Some(200.0)),
            inv("search", true, Some(300.0)),
            inv("other", false, Some(9000.0)),
        ];
        let refs: Vec<&InvocationRecord> = records.iter().collect();
        let stats = compute_subject_stats(&refs, "search");

        assert_eq!(stats.total_calls, 4);
        assert_eq!(stats.success_count, 3);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.percentiles.p50, 200.0);
        assert_eq!(stats.percentiles.p99, 300.0);
    }

    #[test]
    fn test_subject_stats_unknown_subject() {
        let records = vec![inv("search", true, Some(50.0))];
        let refs: Vec<&InvocationRecord> = records.iter().collect();
        let stats = compute_subject_stats(&refs, "missing");
        assert_eq!(stats.total_calls, 0);
        assert_eq!(stats.percentiles, Percentiles::default());
    }

    #[test]
    fn test_cost_is_linear() {
        let records = vec![inv("a", true, None), inv("b", false, None), inv("c", true, None)];
        let refs: Vec<&InvocationRecord> = records.iter().collect();
        let cost = compute_cost(&refs, 0.5);
        assert_eq!(cost.total_calls, 3);
        assert_eq!(cost.estimated_cost, 1.5);
    }
}
