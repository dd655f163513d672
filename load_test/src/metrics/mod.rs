// Metrics module
// Collection, threshold evaluation and reporting

pub mod collector;
pub mod reporter;
pub mod summary;
pub mod thresholds;
pub mod types;

pub use collector::{LatencyStats, MetricsCollector};
pub use summary::Summary;
pub use thresholds::{all_passed, evaluate, ThresholdResult};
