//! End-of-test summary, optionally exported as JSON

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::collector::{LatencyStats, MetricsCollector};
use super::thresholds::{all_passed, ThresholdResult};
use crate::error::{LoadTestError, Result};
use crate::http::RequestTag;

#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub total: u64,
    pub failed: u64,
    pub failure_rate: Option<f64>,
    pub bytes_received: u64,
    pub duration_ms: Option<LatencyStats>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub run_id: Uuid,
    pub profile: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub interrupted: bool,
    pub vus_max: usize,
    pub iterations: u64,
    pub iteration_duration_ms: Option<LatencyStats>,
    pub requests: RequestSummary,
    pub endpoints: BTreeMap<RequestTag, RequestSummary>,
    pub checks: Vec<CheckSummary>,
    pub thresholds: Vec<ThresholdResult>,
    pub thresholds_passed: bool,
}

impl Summary {
    pub fn build(
        run_id: Uuid,
        profile: &str,
        collector: &MetricsCollector,
        thresholds: Vec<ThresholdResult>,
        interrupted: bool,
    ) -> Self {
        let metrics = collector.get_snapshot();

        let request_summary = |tag: Option<RequestTag>| {
            let counts = collector.request_counts(tag);
            RequestSummary {
                total: counts.total,
                failed: counts.failed,
                failure_rate: counts.failure_rate(),
                bytes_received: counts.bytes_received,
                duration_ms: collector.request_latency_stats(tag),
            }
        };

        let endpoints = metrics
            .requests_by_tag
            .keys()
            .map(|tag| (*tag, request_summary(Some(*tag))))
            .collect();

        Summary {
            run_id,
            profile: profile.to_string(),
            started_at: collector.started_at(),
            finished_at: Utc::now(),
            duration_secs: collector.elapsed().as_secs_f64(),
            interrupted,
            vus_max: metrics.vus.max,
            iterations: metrics.iterations,
            iteration_duration_ms: collector.iteration_latency_stats(),
            requests: request_summary(None),
            endpoints,
            checks: metrics
                .checks
                .iter()
                .map(|c| CheckSummary {
                    name: c.name.clone(),
                    passes: c.passes,
                    fails: c.fails,
                })
                .collect(),
            thresholds_passed: all_passed(&thresholds),
            thresholds,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json).map_err(|source| LoadTestError::SummaryExport {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!("Summary written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::thresholds::default_thresholds;
    use crate::http::RequestRecord;
    use crate::metrics::thresholds::evaluate;
    use crate::scenarios::checks::CheckOutcome;
    use std::time::Duration;

    #[test]
    fn test_summary_json_shape() {
        let collector = MetricsCollector::new();
        collector.vu_started();
        collector.record_request(&RequestRecord {
            tag: RequestTag::Order,
            method: "POST",
            url: "http://localhost:30004/api/orders".to_string(),
            status: 201,
            body_len: 64,
            duration: Duration::from_millis(42),
            error: None,
        });
        collector.record_checks(&[CheckOutcome::new("order status 200-201", true)]);
        collector.iteration_completed(Duration::from_millis(900));

        let results = evaluate(&collector, &default_thresholds());
        let summary = Summary::build(Uuid::new_v4(), "smoke", &collector, results, false);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["profile"], "smoke");
        assert_eq!(json["vus_max"], 1);
        assert_eq!(json["iterations"], 1);
        assert_eq!(json["requests"]["total"], 1);
        assert_eq!(json["endpoints"]["order"]["bytes_received"], 64);
        assert!(json["endpoints"].get("auth").is_none());
        assert_eq!(json["checks"][0]["name"], "order status 200-201");
        assert_eq!(json["thresholds"].as_array().unwrap().len(), 6);
        assert_eq!(json["thresholds_passed"], true);
    }

    #[test]
    fn test_write_json_to_missing_directory_fails() {
        let collector = MetricsCollector::new();
        let summary = Summary::build(Uuid::new_v4(), "stress", &collector, vec![], true);

        let path = std::env::temp_dir()
            .join(format!("fasttech-missing-{}", Uuid::new_v4()))
            .join("summary.json");
        let err = summary.write_json(&path).unwrap_err();
        assert!(matches!(err, LoadTestError::SummaryExport { .. }));
    }
}
