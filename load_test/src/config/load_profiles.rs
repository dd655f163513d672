use std::time::Duration;

/// A time-boxed segment ramping linearly towards `target` virtual users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub const fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }

    pub const fn secs(secs: u64, target: usize) -> Self {
        Self::new(Duration::from_secs(secs), target)
    }
}

/// Staged virtual-user schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadProfile {
    pub name: String,
    pub stages: Vec<Stage>,
    /// How long a retired VU may finish its iteration during ramp-down
    pub graceful_ramp_down: Duration,
    /// How long remaining VUs may finish once the last stage ends
    pub graceful_stop: Duration,
}

impl LoadProfile {
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn peak_vus(&self) -> usize {
        self.stages.iter().map(|s| s.target).max().unwrap_or(0)
    }

    /// Target VU count `elapsed` into the run, or `None` once every stage has
    /// completed. Ramps start from 0 and interpolate linearly within a stage.
    pub fn target_at(&self, elapsed: Duration) -> Option<usize> {
        let mut stage_start = Duration::ZERO;
        let mut from = 0usize;

        for stage in &self.stages {
            let stage_end = stage_start + stage.duration;
            if elapsed < stage_end {
                let progress = (elapsed - stage_start).as_secs_f64() / stage.duration.as_secs_f64();
                let delta = stage.target as f64 - from as f64;
                let target = from as f64 + delta * progress;
                return Some(target.round().max(0.0) as usize);
            }
            stage_start = stage_end;
            from = stage.target;
        }

        None
    }
}

/// Get a load profile by name
pub fn get_load_profile(profile: &str) -> LoadProfile {
    match profile {
        "stress" => stress_profile(),
        "smoke" => smoke_profile(),
        "soak" => soak_profile(),
        _ => {
            tracing::warn!("Unknown profile '{}', using 'stress' profile", profile);
            stress_profile()
        }
    }
}

/// Stress profile for the full platform
///
/// - 20s ramp to 50 users
/// - 1m ramp to and hold around 100 users
/// - 30s ramp to 200 users
/// - 2m hold at 200 users
/// - 20s ramp down
pub fn stress_profile() -> LoadProfile {
    LoadProfile {
        name: "stress".to_string(),
        stages: vec![
            Stage::secs(20, 50),
            Stage::secs(60, 100),
            Stage::secs(30, 200),
            Stage::secs(120, 200),
            Stage::secs(20, 0),
        ],
        graceful_ramp_down: Duration::from_secs(30),
        graceful_stop: Duration::from_secs(30),
    }
}

/// Single-user sanity run
pub fn smoke_profile() -> LoadProfile {
    LoadProfile {
        name: "smoke".to_string(),
        stages: vec![Stage::secs(5, 1), Stage::secs(10, 1), Stage::secs(5, 0)],
        graceful_ramp_down: Duration::from_secs(10),
        graceful_stop: Duration::from_secs(10),
    }
}

/// Moderate load held for ten minutes to surface degradation
pub fn soak_profile() -> LoadProfile {
    LoadProfile {
        name: "soak".to_string(),
        stages: vec![Stage::secs(60, 20), Stage::secs(600, 20), Stage::secs(60, 0)],
        graceful_ramp_down: Duration::from_secs(30),
        graceful_stop: Duration::from_secs(30),
    }
}
