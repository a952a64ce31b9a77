//! Health heuristics derived from metrics

use std::collections::BTreeMap;

use crate::types::{
    Aggregated, AggregatedInsights, Insight, InsightKind, InsightsView, MetricsView, Severity,
    SourceInsight,
};

/// Mean duration (ms) above which a tool is reported as slow
pub const SLOW_SUBJECT_MS: f64 = 1000.0;
/// Mean duration (ms) above which a slow tool is rated high
pub const VERY_SLOW_SUBJECT_MS: f64 = 5000.0;
/// Error rate above which an error spike is reported
pub const ERROR_SPIKE_RATE: f64 = 0.1;
/// Error rate above which an error spike is critical
pub const CRITICAL_ERROR_RATE: f64 = 0.3;

pub fn insights_from_metrics(metrics: &MetricsView) -> InsightsView {
    let mut insights = Vec::new();

    for subject in &metrics.top_subjects {
        if subject.avg_duration > SLOW_SUBJECT_MS {
            let severity = if subject.avg_duration > VERY_SLOW_SUBJECT_MS {
                Severity::High
            } else {
                Severity::Medium
            };
            insights.push(Insight {
                kind: InsightKind::SlowSubject,
                severity,
                subject_name: Some(subject.subject_name.clone()),
                message: format!(
                    "{} averages {:.0}ms per call over {} calls",
                    subject.subject_name, subject.avg_duration, subject.calls
                ),
                value: subject.avg_duration,
            });
        }
    }

    if metrics.error_rate > ERROR_SPIKE_RATE {
        let severity = if metrics.error_rate > CRITICAL_ERROR_RATE {
            Severity::Critical
        } else {
            Severity::High
        };
        insights.push(Insight {
            kind: InsightKind::ErrorSpike,
            severity,
            subject_name: None,
            message: format!(
                "error rate is {:.1}% across {} calls",
                metrics.error_rate * 100.0,
                metrics.total_calls
            ),
            value: metrics.error_rate,
        });
    }

    InsightsView {
        insights,
        health_score: (1.0 - metrics.error_rate).max(0.0),
    }
}

/// Analyze each source independently and escalate high/critical findings
///
/// The overall score is the unweighted mean of per-source scores, 1.0 when
/// no source has data.
pub fn aggregate_insights(metrics: &Aggregated<MetricsView>) -> AggregatedInsights {
    let by_source: BTreeMap<String, InsightsView> = metrics
        .by_source
        .iter()
        .map(|(source, view)| (source.clone(), insights_from_metrics(view)))
        .collect();

    let critical_insights: Vec<SourceInsight> = by_source
        .iter()
        .flat_map(|(source, view)| {
            view.insights
                .iter()
                .filter(|insight| insight.severity.is_escalated())
                .map(move |insight| SourceInsight {
                    source_id: source.clone(),
                    insight: insight.clone(),
                })
        })
        .collect();

    let overall_health_score = if by_source.is_empty() {
        1.0
    } else {
        by_source.values().map(|v| v.health_score).sum::<f64>() / by_source.len() as f64
    };

    AggregatedInsights {
        by_source,
        critical_insights,
        overall_health_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SubjectSummary;

    fn metrics(error_rate: f64, subjects: &[(&str, f64)]) -> MetricsView {
        MetricsView {
            total_calls: 100,
            success_rate: 1.0 - error_rate,
            error_rate,
            top_subjects: subjects
                .iter()
                .map(|(name, avg)| SubjectSummary {
                    subject_name: name.to_string(),
                    calls: 10,
                    avg_duration: *avg,
                })
                .collect(),
            ..MetricsView::default()
        }
    }

    #[test]
    fn test_healthy_metrics_have_no_insights() {
        let view = insights_from_metrics(&metrics(0.05, &[("fast", 20.0), ("edge", 1000.0)]));
        assert!(view.insights.is_empty());
        assert!((view.health_score - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_slow_subject_severity() {
        let view = insights_from_metrics(&metrics(0.0, &[("medium", 1500.0), ("slow", 6000.0)]));
        assert_eq!(view.insights.len(), 2);

        let medium = &view.insights[0];
        assert_eq!(medium.kind, InsightKind::SlowSubject);
        assert_eq!(medium.severity, Severity::Medium);
        assert_eq!(medium.subject_name.as_deref(), Some("medium"));

        assert_eq!(view.insights[1].severity, Severity::High);
    }

    #[test]
    fn test_error_spike_severity() {
        let high = insights_from_metrics(&metrics(0.2, &[]));
        assert_eq!(high.insights[0].kind, InsightKind::ErrorSpike);
        assert_eq!(high.insights[0].severity, Severity::High);

        let critical = insights_from_metrics(&metrics(0.5, &[]));
        assert_eq!(critical.insights[0].severity, Severity::Critical);
        assert_eq!(critical.health_score, 0.5);

        // Exactly at the threshold is not a spike
        assert!(insights_from_metrics(&metrics(0.1, &[])).insights.is_empty());
    }

    #[test]
    fn test_aggregate_insights() {
        let mut by_source = BTreeMap::new();
        by_source.insert("healthy".to_string(), metrics(0.0, &[("ok", 10.0)]));
        by_source.insert("broken".to_string(), metrics(0.5, &[("slowish", 2000.0)]));
        let aggregated = Aggregated {
            combined: metrics(0.25, &[]),
            by_source,
        };

        let report = aggregate_insights(&aggregated);

        assert_eq!(report.by_source.len(), 2);
        assert_eq!(report.overall_health_score, 0.75);
        // Medium slow-subject finding stays local; the critical spike escalates
        assert_eq!(report.critical_insights.len(), 1);
        assert_eq!(report.critical_insights[0].source_id, "broken");
        assert_eq!(report.critical_insights[0].insight.severity, Severity::Critical);
    }

    #[test]
    fn test_aggregate_insights_without_sources() {
        let aggregated = Aggregated {
            combined: MetricsView::default(),
            by_source: BTreeMap::new(),
        };
        let report = aggregate_insights(&aggregated);
        assert_eq!(report.overall_health_score, 1.0);
        assert!(report.critical_insights.is_empty());
    }
}
