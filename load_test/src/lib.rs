//! Load test for the FastTech food-ordering platform.
//!
//! Drives the auth, menu, search and order services through a scripted
//! virtual-user workflow under a staged concurrency ramp, then evaluates
//! latency and failure-rate thresholds over the collected metrics.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use error::{LoadTestError, Result};
