//! Validated configuration for a load test run

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::RunArgs;
use crate::config::endpoints::Endpoints;
use crate::config::load_profiles::{get_load_profile, LoadProfile};
use crate::config::thresholds::{default_thresholds, Threshold};
use crate::error::{LoadTestError, Result};
use crate::scenarios::payloads::MAX_THINK_TIME_SCALE;

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub endpoints: Endpoints,
    pub profile: LoadProfile,
    pub thresholds: Vec<Threshold>,
    pub think_time_scale: f64,
    pub request_timeout: Duration,
    /// `None` disables the live metrics view
    pub report_interval: Option<Duration>,
    pub summary_export: Option<PathBuf>,
    pub seed: Option<u64>,
}

impl RunConfig {
    /// Build a configuration for `profile` against `endpoints` with the
    /// default thresholds and pauses.
    pub fn new(endpoints: Endpoints, profile: LoadProfile) -> Self {
        Self {
            endpoints,
            profile,
            thresholds: default_thresholds(),
            think_time_scale: 1.0,
            request_timeout: Duration::from_secs(60),
            report_interval: Some(Duration::from_secs(5)),
            summary_export: None,
            seed: None,
        }
    }

    pub fn from_args(args: &RunArgs) -> Result<Self> {
        let endpoints = Endpoints::parse(
            &args.auth_url,
            &args.menu_url,
            &args.search_url,
            &args.order_url,
        )?;

        let mut config = RunConfig::new(endpoints, get_load_profile(&args.profile));
        config.thresholds.extend(parse_extra_thresholds(&args.thresholds)?);
        config.think_time_scale = args.think_time_scale;
        config.request_timeout = Duration::from_secs(args.request_timeout);
        config.report_interval = (args.report_interval > 0)
            .then(|| Duration::from_secs(args.report_interval));
        config.summary_export = args.summary_export.clone();
        config.seed = args.seed;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=MAX_THINK_TIME_SCALE).contains(&self.think_time_scale) {
            return Err(LoadTestError::InvalidConfig(format!(
                "think time scale must be between 0 and {}, got {}",
                MAX_THINK_TIME_SCALE, self.think_time_scale
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(LoadTestError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.profile.stages.is_empty() {
            return Err(LoadTestError::InvalidConfig(format!(
                "profile '{}' has no stages",
                self.profile.name
            )));
        }
        Ok(())
    }
}

/// Parse `SELECTOR=CONDITION` thresholds given on the command line.
pub fn parse_extra_thresholds(raw: &[String]) -> Result<Vec<Threshold>> {
    raw.iter().map(|t| Threshold::parse_assignment(t)).collect()
}
