//! Ramping virtual users
//!
//! Every tick the scheduler compares the live VU count with the profile's
//! interpolated target. Missing VUs are spawned; surplus VUs (newest first)
//! are asked to stop after their current iteration and aborted if they are
//! still running once the graceful ramp-down window has passed.

use std::future::Future;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout_at, Duration, Instant, MissedTickBehavior};

use crate::config::load_profiles::LoadProfile;
use crate::metrics::collector::MetricsCollector;
use crate::scenarios::food_ordering::{run_iteration, ScenarioContext};

const SCHEDULER_TICK: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// The run was stopped before the last stage completed
    pub interrupted: bool,
    pub vus_spawned: usize,
}

/// Holds a VU slot in the active gauge for as long as the task is alive,
/// including when the task is aborted.
struct VuGauge(MetricsCollector);

impl VuGauge {
    fn new(collector: MetricsCollector) -> Self {
        collector.vu_started();
        Self(collector)
    }
}

impl Drop for VuGauge {
    fn drop(&mut self) {
        self.0.vu_stopped();
    }
}

struct VirtualUser {
    id: usize,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl VirtualUser {
    fn spawn(id: usize, ctx: Arc<ScenarioContext>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(id as u64)),
            None => StdRng::from_entropy(),
        };
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(virtual_user_loop(id, ctx, rng, stop_rx));

        Self { id, stop, handle }
    }

    fn request_stop(&self) {
        let _ = self.stop.send(true);
    }

    async fn join_by(mut self, deadline: Instant) {
        match timeout_at(deadline, &mut self.handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_panic() => tracing::error!("VU {} panicked: {}", self.id, e),
            Ok(Err(_)) => {}
            Err(_) => {
                tracing::warn!("VU {} still running after graceful stop, aborting", self.id);
                self.handle.abort();
                // Wait for the cancelled task to release its gauge slot
                let _ = (&mut self.handle).await;
            }
        }
    }
}

async fn virtual_user_loop(
    id: usize,
    ctx: Arc<ScenarioContext>,
    mut rng: StdRng,
    stop: watch::Receiver<bool>,
) {
    let _gauge = VuGauge::new(ctx.collector().clone());
    tracing::debug!("VU {} started", id);

    loop {
        let stopped = *stop.borrow();
        if stopped {
            break;
        }

        let start = Instant::now();
        let report = run_iteration(&ctx, &mut rng).await;
        ctx.collector().iteration_completed(start.elapsed());

        if report.failed_checks() > 0 {
            tracing::debug!(
                "VU {} iteration {} had {} failed checks",
                id,
                report.random_id,
                report.failed_checks()
            );
        }
    }

    tracing::debug!("VU {} stopped", id);
}

/// Drive `profile` until its last stage ends or `shutdown` resolves, then
/// stop every VU within the profile's graceful stop window.
pub async fn execute<F>(
    profile: &LoadProfile,
    ctx: Arc<ScenarioContext>,
    seed: Option<u64>,
    shutdown: F,
) -> RunOutcome
where
    F: Future<Output = ()>,
{
    let mut active: Vec<VirtualUser> = Vec::new();
    let mut retiring: Vec<(VirtualUser, Instant)> = Vec::new();
    let mut aborted: Vec<JoinHandle<()>> = Vec::new();
    let mut next_id = 0usize;
    let mut current_target = None;
    let mut interrupted = false;

    let mut ticker = interval(SCHEDULER_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let start = Instant::now();
    tracing::info!(
        "Starting profile '{}': {} stages over {}s, peak {} VUs",
        profile.name,
        profile.stages.len(),
        profile.total_duration().as_secs(),
        profile.peak_vus()
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                tracing::warn!("Interrupted, stopping virtual users");
                interrupted = true;
                break;
            }
        }

        let Some(target) = profile.target_at(start.elapsed()) else {
            break;
        };
        if current_target != Some(target) {
            tracing::debug!("Target VUs: {} (active {})", target, active.len());
            current_target = Some(target);
        }

        aborted.extend(reap_retiring(&mut retiring));
        let ended = reap_finished(&mut active).await;
        if ended > 0 {
            tracing::warn!("{} VUs ended on their own, respawning up to {}", ended, target);
        }

        while active.len() < target {
            active.push(VirtualUser::spawn(next_id, ctx.clone(), seed));
            next_id += 1;
        }
        while active.len() > target {
            let Some(vu) = active.pop() else {
                break;
            };
            vu.request_stop();
            retiring.push((vu, Instant::now() + profile.graceful_ramp_down));
        }
    }

    tracing::info!(
        "Load profile finished, waiting for {} virtual users...",
        active.len() + retiring.len()
    );

    let stop_deadline = Instant::now() + profile.graceful_stop;
    for vu in &active {
        vu.request_stop();
    }

    let remaining = active
        .into_iter()
        .map(|vu| (vu, stop_deadline))
        .chain(
            retiring
                .into_iter()
                .map(|(vu, deadline)| (vu, deadline.min(stop_deadline))),
        );
    for (vu, deadline) in remaining {
        vu.join_by(deadline).await;
    }
    for handle in aborted {
        let _ = handle.await;
    }

    tracing::info!("All virtual users stopped");

    RunOutcome {
        interrupted,
        vus_spawned: next_id,
    }
}

/// Drop active VUs whose task has already exited, returning how many.
async fn reap_finished(active: &mut Vec<VirtualUser>) -> usize {
    let (finished, running): (Vec<_>, Vec<_>) =
        active.drain(..).partition(|vu| vu.handle.is_finished());
    *active = running;

    let count = finished.len();
    for vu in finished {
        match vu.handle.await {
            Err(e) if e.is_panic() => tracing::error!("VU {} panicked: {}", vu.id, e),
            _ => tracing::warn!("VU {} exited before being stopped", vu.id),
        }
    }
    count
}

/// Drop retired VUs that have exited and abort those past their deadline,
/// returning the aborted tasks' handles.
fn reap_retiring(retiring: &mut Vec<(VirtualUser, Instant)>) -> Vec<JoinHandle<()>> {
    let now = Instant::now();
    let mut aborted = Vec::new();
    for (vu, deadline) in std::mem::take(retiring) {
        if vu.handle.is_finished() {
            continue;
        }
        if now >= deadline {
            tracing::warn!("VU {} exceeded graceful ramp-down, aborting", vu.id);
            vu.handle.abort();
            aborted.push(vu.handle);
        } else {
            retiring.push((vu, deadline));
        }
    }
    aborted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vu_with_task<F>(id: usize, task: F) -> VirtualUser
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (stop, _) = watch::channel(false);
        VirtualUser {
            id,
            stop,
            handle: tokio::spawn(task),
        }
    }

    #[tokio::test]
    async fn test_reap_finished_drops_exited_vus() {
        let mut active = vec![
            vu_with_task(0, std::future::pending()),
            vu_with_task(1, async { panic!("iteration failed") }),
            vu_with_task(2, async {}),
            vu_with_task(3, std::future::pending()),
        ];
        while !(active[1].handle.is_finished() && active[2].handle.is_finished()) {
            tokio::task::yield_now().await;
        }

        assert_eq!(reap_finished(&mut active).await, 2);
        let ids: Vec<_> = active.iter().map(|vu| vu.id).collect();
        assert_eq!(ids, [0, 3]);

        // Nothing else has exited
        assert_eq!(reap_finished(&mut active).await, 0);
        assert_eq!(active.len(), 2);

        for vu in active {
            vu.handle.abort();
        }
    }

    #[tokio::test]
    async fn test_reap_retiring_aborts_past_deadline() {
        let now = Instant::now();
        let mut retiring = vec![
            (vu_with_task(0, std::future::pending()), now),
            (vu_with_task(1, std::future::pending()), now + Duration::from_secs(60)),
        ];

        let aborted = reap_retiring(&mut retiring);

        assert_eq!(aborted.len(), 1);
        for handle in aborted {
            assert!(handle.await.unwrap_err().is_cancelled());
        }
        assert_eq!(retiring.len(), 1);
        assert_eq!(retiring[0].0.id, 1);
        retiring[0].0.handle.abort();
    }
}
