//! Metric types

use std::collections::BTreeMap;

use crate::http::RequestTag;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub total: u64,
    /// Status outside 200-399 or no response
    pub failed: u64,
    pub bytes_received: u64,
}

impl RequestCounts {
    pub fn failure_rate(&self) -> Option<f64> {
        (self.total > 0).then(|| self.failed as f64 / self.total as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTally {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

impl CheckTally {
    pub fn total(&self) -> u64 {
        self.passes + self.fails
    }

    pub fn pass_rate(&self) -> Option<f64> {
        let total = self.total();
        (total > 0).then(|| self.passes as f64 / total as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VuMetrics {
    pub active: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SystemMetrics {
    pub cpu_usage: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TestMetrics {
    pub requests: RequestCounts,
    pub requests_by_tag: BTreeMap<RequestTag, RequestCounts>,
    /// Tallies in the order each check was first seen
    pub checks: Vec<CheckTally>,
    pub iterations: u64,
    pub vus: VuMetrics,
    pub system: SystemMetrics,
}

impl TestMetrics {
    /// Passing and failing check counts across every check
    pub fn check_totals(&self) -> (u64, u64) {
        self.checks
            .iter()
            .fold((0, 0), |(p, f), c| (p + c.passes, f + c.fails))
    }

    pub fn check_pass_rate(&self) -> Option<f64> {
        let (passes, fails) = self.check_totals();
        let total = passes + fails;
        (total > 0).then(|| passes as f64 / total as f64)
    }
}
