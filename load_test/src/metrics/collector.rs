//! Metrics collector - thread-safe collection with latency tracking

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use hdrhistogram::Histogram;
use parking_lot::RwLock;
use serde::Serialize;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use super::types::{CheckTally, RequestCounts, TestMetrics};
use crate::config::thresholds::Aggregation;
use crate::http::{RequestRecord, RequestTag};
use crate::scenarios::checks::CheckOutcome;

/// Latencies are recorded in microseconds and reported in milliseconds.
fn latency_histogram() -> Histogram<u64> {
    // 3 significant digits, auto-resizing
    Histogram::new(3).expect("3 significant figures is a valid histogram precision")
}

fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn micros_to_ms(value: u64) -> f64 {
    value as f64 / 1000.0
}

/// Low end of the bucket holding `value`, in milliseconds
fn lowest_ms(hist: &Histogram<u64>, value: u64) -> f64 {
    micros_to_ms(hist.lowest_equivalent(value))
}

fn quantile_ms(hist: &Histogram<u64>, quantile: f64) -> f64 {
    lowest_ms(hist, hist.value_at_quantile(quantile))
}

struct RequestHistograms {
    all: Histogram<u64>,
    by_tag: HashMap<RequestTag, Histogram<u64>>,
}

#[derive(Clone)]
pub struct MetricsCollector {
    metrics: Arc<RwLock<TestMetrics>>,
    request_latencies: Arc<RwLock<RequestHistograms>>,
    iteration_latencies: Arc<RwLock<Histogram<u64>>>,
    system: Arc<RwLock<System>>,
    start_time: Instant,
    started_at: DateTime<Utc>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let system = System::new_with_specifics(
            RefreshKind::new()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );

        Self {
            metrics: Arc::new(RwLock::new(TestMetrics::default())),
            request_latencies: Arc::new(RwLock::new(RequestHistograms {
                all: latency_histogram(),
                by_tag: HashMap::new(),
            })),
            iteration_latencies: Arc::new(RwLock::new(latency_histogram())),
            system: Arc::new(RwLock::new(system)),
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn record_request(&self, record: &RequestRecord) {
        let failed = record.is_failed();
        let bytes = record.body_len as u64;

        let mut guard = self.metrics.write();
        let metrics = &mut *guard;
        for counts in [
            &mut metrics.requests,
            metrics.requests_by_tag.entry(record.tag).or_default(),
        ] {
            counts.total += 1;
            counts.failed += u64::from(failed);
            counts.bytes_received += bytes;
        }
        drop(guard);

        let micros = as_micros(record.duration);
        let mut latencies = self.request_latencies.write();
        latencies.all.saturating_record(micros);
        latencies
            .by_tag
            .entry(record.tag)
            .or_insert_with(latency_histogram)
            .saturating_record(micros);
    }

    pub fn record_checks(&self, outcomes: &[CheckOutcome]) {
        let mut metrics = self.metrics.write();
        for outcome in outcomes {
            let idx = match metrics.checks.iter().position(|c| c.name == outcome.name) {
                Some(idx) => idx,
                None => {
                    metrics.checks.push(CheckTally {
                        name: outcome.name.to_string(),
                        passes: 0,
                        fails: 0,
                    });
                    metrics.checks.len() - 1
                }
            };
            let tally = &mut metrics.checks[idx];
            if outcome.passed {
                tally.passes += 1;
            } else {
                tally.fails += 1;
            }
        }
    }

    pub fn iteration_completed(&self, duration: Duration) {
        self.metrics.write().iterations += 1;
        self.iteration_latencies
            .write()
            .saturating_record(as_micros(duration));
    }

    pub fn vu_started(&self) {
        let mut metrics = self.metrics.write();
        metrics.vus.active += 1;
        metrics.vus.max = metrics.vus.max.max(metrics.vus.active);
    }

    pub fn vu_stopped(&self) {
        let mut metrics = self.metrics.write();
        metrics.vus.active = metrics.vus.active.saturating_sub(1);
    }

    /// Update system metrics (CPU, memory) of the load generator host
    pub fn update_system_metrics(&self) {
        let mut system = self.system.write();
        system.refresh_cpu_all();
        system.refresh_memory();

        let mut metrics = self.metrics.write();
        metrics.system.cpu_usage = system.global_cpu_usage();
        metrics.system.memory_used_mb = system.used_memory() / 1024 / 1024;
        metrics.system.memory_total_mb = system.total_memory() / 1024 / 1024;
    }

    pub fn get_snapshot(&self) -> TestMetrics {
        self.metrics.read().clone()
    }

    /// Request counters, overall or for one tag
    pub fn request_counts(&self, tag: Option<RequestTag>) -> RequestCounts {
        let metrics = self.metrics.read();
        match tag {
            None => metrics.requests.clone(),
            Some(tag) => metrics.requests_by_tag.get(&tag).cloned().unwrap_or_default(),
        }
    }

    pub fn request_latency_stats(&self, tag: Option<RequestTag>) -> Option<LatencyStats> {
        let latencies = self.request_latencies.read();
        match tag {
            None => LatencyStats::from_histogram(&latencies.all),
            Some(tag) => latencies.by_tag.get(&tag).and_then(LatencyStats::from_histogram),
        }
    }

    pub fn iteration_latency_stats(&self) -> Option<LatencyStats> {
        LatencyStats::from_histogram(&self.iteration_latencies.read())
    }

    /// Aggregate request durations in milliseconds; `None` without samples
    pub fn request_duration(&self, tag: Option<RequestTag>, aggregation: Aggregation) -> Option<f64> {
        let latencies = self.request_latencies.read();
        let hist = match tag {
            None => Some(&latencies.all),
            Some(tag) => latencies.by_tag.get(&tag),
        }?;
        aggregate(hist, aggregation)
    }

    pub fn iteration_duration(&self, aggregation: Aggregation) -> Option<f64> {
        aggregate(&self.iteration_latencies.read(), aggregation)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed().as_secs()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn aggregate(hist: &Histogram<u64>, aggregation: Aggregation) -> Option<f64> {
    if hist.is_empty() {
        return None;
    }
    let value = match aggregation {
        Aggregation::Count => hist.len() as f64,
        Aggregation::Avg => hist.mean() / 1000.0,
        Aggregation::Min => micros_to_ms(hist.min()),
        Aggregation::Max => lowest_ms(hist, hist.max()),
        Aggregation::Med => quantile_ms(hist, 0.5),
        Aggregation::Percentile(p) => quantile_ms(hist, p / 100.0),
        Aggregation::Rate => return None,
    };
    Some(value)
}

/// Latency summary in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub min: f64,
    pub med: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
    pub max: f64,
    pub mean: f64,
    pub count: u64,
}

impl LatencyStats {
    fn from_histogram(hist: &Histogram<u64>) -> Option<Self> {
        if hist.is_empty() {
            return None;
        }
        Some(LatencyStats {
            min: micros_to_ms(hist.min()),
            med: quantile_ms(hist, 0.50),
            p90: quantile_ms(hist, 0.90),
            p95: quantile_ms(hist, 0.95),
            p99: quantile_ms(hist, 0.99),
            max: lowest_ms(hist, hist.max()),
            mean: hist.mean() / 1000.0,
            count: hist.len(),
        })
    }
}
