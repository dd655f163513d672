//! Threshold evaluation over collected metrics

use serde::Serialize;

use super::collector::MetricsCollector;
use crate::config::thresholds::{Aggregation, MetricName, Threshold};
use crate::http::RequestTag;

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdResult {
    pub metric: String,
    pub condition: String,
    /// Observed aggregate, `None` when the metric has no samples
    pub observed: Option<f64>,
    pub passed: bool,
}

/// Evaluate every threshold. A threshold whose metric has no samples passes.
pub fn evaluate(collector: &MetricsCollector, thresholds: &[Threshold]) -> Vec<ThresholdResult> {
    thresholds
        .iter()
        .map(|threshold| {
            let observed = observe(collector, threshold);
            let passed = observed
                .map(|value| threshold.condition.comparison.holds(value, threshold.condition.value))
                .unwrap_or(true);

            if !passed {
                tracing::warn!(
                    "Threshold crossed: {} (observed {:.4})",
                    threshold,
                    observed.unwrap_or_default()
                );
            }

            ThresholdResult {
                metric: threshold.selector(),
                condition: threshold.condition.to_string(),
                observed,
                passed,
            }
        })
        .collect()
}

pub fn all_passed(results: &[ThresholdResult]) -> bool {
    results.iter().all(|r| r.passed)
}

fn observe(collector: &MetricsCollector, threshold: &Threshold) -> Option<f64> {
    let tag = match threshold.tag.as_deref() {
        None => None,
        Some(name) => match name.parse::<RequestTag>() {
            Ok(tag) => Some(tag),
            Err(_) => {
                tracing::debug!("No requests are tagged '{}'", name);
                return None;
            }
        },
    };
    let aggregation = threshold.condition.aggregation;

    match threshold.metric {
        MetricName::HttpReqDuration => collector.request_duration(tag, aggregation),
        MetricName::IterationDuration => collector.iteration_duration(aggregation),
        MetricName::HttpReqFailed => {
            let counts = collector.request_counts(tag);
            match aggregation {
                Aggregation::Count => (counts.total > 0).then_some(counts.failed as f64),
                _ => counts.failure_rate(),
            }
        }
        MetricName::Checks => {
            let metrics = collector.get_snapshot();
            match aggregation {
                Aggregation::Count => {
                    let (passes, fails) = metrics.check_totals();
                    (passes + fails > 0).then_some(passes as f64)
                }
                _ => metrics.check_pass_rate(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::thresholds::default_thresholds;
    use crate::http::RequestRecord;
    use crate::scenarios::checks::CheckOutcome;
    use std::time::Duration;

    fn record(collector: &MetricsCollector, tag: RequestTag, status: u16, ms: u64) {
        collector.record_request(&RequestRecord {
            tag,
            method: "POST",
            url: format!("http://localhost/{tag}"),
            status,
            body_len: 2,
            duration: Duration::from_millis(ms),
            error: None,
        });
    }

    fn result<'a>(results: &'a [ThresholdResult], metric: &str) -> &'a ThresholdResult {
        results.iter().find(|r| r.metric == metric).unwrap()
    }

    #[test]
    fn test_empty_run_passes() {
        let collector = MetricsCollector::new();
        let results = evaluate(&collector, &default_thresholds());

        assert_eq!(results.len(), 6);
        assert!(all_passed(&results));
        assert!(results.iter().all(|r| r.observed.is_none()));
    }

    #[test]
    fn test_fast_healthy_run_passes() {
        let collector = MetricsCollector::new();
        for _ in 0..50 {
            record(&collector, RequestTag::Auth, 200, 120);
            record(&collector, RequestTag::Menu, 201, 80);
            record(&collector, RequestTag::Search, 200, 40);
            record(&collector, RequestTag::Order, 201, 150);
        }

        let results = evaluate(&collector, &default_thresholds());
        assert!(all_passed(&results));
        assert_eq!(result(&results, "http_req_failed").observed, Some(0.0));
    }

    #[test]
    fn test_slow_search_fails_only_its_thresholds() {
        let collector = MetricsCollector::new();
        for _ in 0..100 {
            record(&collector, RequestTag::Auth, 200, 100);
            record(&collector, RequestTag::Search, 200, 350);
        }

        let results = evaluate(&collector, &default_thresholds());
        assert!(!all_passed(&results));
        assert!(!result(&results, "http_req_duration{name:search}").passed);
        assert!(result(&results, "http_req_duration{name:auth}").passed);
        // half of all requests are at 350ms, so p(90) stays under 500ms
        assert!(result(&results, "http_req_duration").passed);
    }

    #[test]
    fn test_failure_rate_threshold() {
        let collector = MetricsCollector::new();
        for i in 0..100 {
            let status = if i < 6 { 401 } else { 200 };
            record(&collector, RequestTag::Auth, status, 10);
        }

        let results = evaluate(&collector, &default_thresholds());
        let failed = result(&results, "http_req_failed");
        assert!(!failed.passed);
        assert_eq!(failed.observed, Some(0.06));
    }

    #[test]
    fn test_checks_and_unknown_tags() {
        let collector = MetricsCollector::new();
        collector.record_checks(&[
            CheckOutcome::new("menu status 200-201", true),
            CheckOutcome::new("menu response time < 400ms", false),
        ]);

        let thresholds = vec![
            Threshold::parse("checks", "rate>0.9").unwrap(),
            Threshold::parse("http_req_duration{name:payment}", "p(95)<100").unwrap(),
        ];
        let results = evaluate(&collector, &thresholds);

        assert!(!results[0].passed);
        assert_eq!(results[0].observed, Some(0.5));
        assert!(results[1].passed);
        assert_eq!(results[1].observed, None);
    }
}
