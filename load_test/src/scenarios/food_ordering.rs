//! Food-ordering scenario - authenticate, create a menu item, search, order
//!
//! One iteration walks the four services strictly in sequence with a random
//! pause after each step. Every step runs regardless of how earlier steps
//! went; outcomes only feed the metrics.

use std::future::Future;
use std::sync::Arc;

use rand::Rng;
use reqwest::header::ACCEPT;
use uuid::Uuid;

use super::checks::{self, CheckOutcome};
use super::payloads;
use crate::config::endpoints::Endpoints;
use crate::config::run::RunConfig;
use crate::error::Result;
use crate::http::{RequestRecord, RequestTag, TaggedClient};
use crate::metrics::collector::MetricsCollector;
use crate::metrics::reporter;
use crate::metrics::summary::Summary;
use crate::metrics::thresholds;
use crate::runner::ramping_vus;

/// Upper bounds of the pause after each step, in seconds
pub const AUTH_THINK_TIME_SECS: f64 = 2.0;
pub const MENU_THINK_TIME_SECS: f64 = 1.0;
pub const SEARCH_THINK_TIME_SECS: f64 = 2.0;
pub const ORDER_THINK_TIME_SECS: f64 = 3.0;

/// Shared by every virtual user of a run
pub struct ScenarioContext {
    client: TaggedClient,
    endpoints: Endpoints,
    think_time_scale: f64,
}

impl ScenarioContext {
    pub fn new(client: TaggedClient, endpoints: Endpoints, think_time_scale: f64) -> Self {
        Self {
            client,
            endpoints,
            think_time_scale,
        }
    }

    pub fn collector(&self) -> &MetricsCollector {
        self.client.collector()
    }

    async fn pause<R: Rng + ?Sized>(&self, rng: &mut R, max_secs: f64) {
        let pause = payloads::think_time(rng, max_secs, self.think_time_scale);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

#[derive(Debug, Clone)]
pub struct IterationReport {
    pub random_id: u32,
    pub requests: Vec<RequestRecord>,
    pub checks: Vec<CheckOutcome>,
}

impl IterationReport {
    fn new(random_id: u32) -> Self {
        Self {
            random_id,
            requests: Vec::with_capacity(4),
            checks: Vec::with_capacity(8),
        }
    }

    /// Tally `outcomes` and keep the record
    fn record(&mut self, collector: &MetricsCollector, record: RequestRecord, outcomes: &[CheckOutcome]) {
        collector.record_checks(outcomes);
        for outcome in outcomes.iter().filter(|o| !o.passed) {
            tracing::debug!(
                "Check failed: {} (status {}, {:.1}ms)",
                outcome.name,
                record.status,
                record.duration_ms()
            );
        }
        self.checks.extend_from_slice(outcomes);
        self.requests.push(record);
    }

    pub fn failed_checks(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn request(&self, tag: RequestTag) -> Option<&RequestRecord> {
        self.requests.iter().find(|r| r.tag == tag)
    }
}

/// Run one scenario iteration for a virtual user.
pub async fn run_iteration<R: Rng + Send + ?Sized>(
    ctx: &ScenarioContext,
    rng: &mut R,
) -> IterationReport {
    let collector = ctx.collector();
    let random_id = payloads::random_id(rng);
    let mut report = IterationReport::new(random_id);

    // AuthService
    let auth = ctx
        .client
        .post_json(
            RequestTag::Auth,
            &ctx.endpoints.auth,
            &payloads::auth_payload(random_id),
            &[(ACCEPT, "*/*")],
        )
        .await;
    let outcomes = checks::auth_checks(&auth);
    report.record(collector, auth, &outcomes);
    ctx.pause(rng, AUTH_THINK_TIME_SECS).await;

    // MenuService
    let menu_item = payloads::menu_item_payload(random_id, rng);
    let menu = ctx
        .client
        .post_json(RequestTag::Menu, &ctx.endpoints.menu, &menu_item, &[])
        .await;
    let outcomes = checks::menu_checks(&menu);
    report.record(collector, menu, &outcomes);
    ctx.pause(rng, MENU_THINK_TIME_SECS).await;

    // SearchService
    let search = ctx.client.get(RequestTag::Search, &ctx.endpoints.search).await;
    let outcomes = checks::search_checks(&search);
    report.record(collector, search, &outcomes);
    ctx.pause(rng, SEARCH_THINK_TIME_SECS).await;

    // OrderService
    let order_payload = payloads::order_payload(random_id, rng);
    let order = ctx
        .client
        .post_json(RequestTag::Order, &ctx.endpoints.order, &order_payload, &[])
        .await;
    let outcomes = checks::order_checks(&order);
    report.record(collector, order, &outcomes);
    ctx.pause(rng, ORDER_THINK_TIME_SECS).await;

    report
}

/// Run the full load test, stopping early on Ctrl+C.
pub async fn run(config: RunConfig) -> Result<Summary> {
    run_until(config, ctrl_c()).await
}

/// Run the full load test, stopping early when `shutdown` resolves.
pub async fn run_until<F>(config: RunConfig, shutdown: F) -> Result<Summary>
where
    F: Future<Output = ()>,
{
    let run_id = Uuid::new_v4();
    tracing::info!("Starting food-ordering scenario (run {})", run_id);

    // Setup metrics collector
    let collector = MetricsCollector::new();
    let client = TaggedClient::new(config.request_timeout, collector.clone())?;
    let ctx = Arc::new(ScenarioContext::new(
        client,
        config.endpoints.clone(),
        config.think_time_scale,
    ));

    // Start periodic metrics reporter
    let reporter_handle = config.report_interval.map(|every| {
        let collector_clone = collector.clone();
        tokio::spawn(async move {
            reporter::start_periodic_reporter(collector_clone, every).await;
        })
    });

    let outcome = ramping_vus::execute(&config.profile, ctx, config.seed, shutdown).await;

    if let Some(handle) = reporter_handle {
        handle.abort();
    }

    tracing::info!(
        "Scenario finished: {} VUs spawned{}",
        outcome.vus_spawned,
        if outcome.interrupted { " (interrupted)" } else { "" }
    );

    let results = thresholds::evaluate(&collector, &config.thresholds);

    // Print final report
    reporter::print_final_report(&collector, &results);

    let summary = Summary::build(
        run_id,
        &config.profile.name,
        &collector,
        results,
        outcome.interrupted,
    );
    if let Some(path) = &config.summary_export {
        summary.write_json(path)?;
    }

    Ok(summary)
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    #[tokio::test]
    async fn test_iteration_continues_past_unreachable_services() {
        // Bind then drop a listener to get a port nothing is listening on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let endpoints = Endpoints::parse(
            &format!("{base}/api/login"),
            &format!("{base}/api/menu-items"),
            &format!("{base}/api/search/menu-items?query=produto"),
            &format!("{base}/api/orders"),
        )
        .unwrap();

        let collector = MetricsCollector::new();
        let client = TaggedClient::new(Duration::from_secs(2), collector.clone()).unwrap();
        let ctx = ScenarioContext::new(client, endpoints, 0.0);
        let mut rng = StdRng::seed_from_u64(4242);

        let report = run_iteration(&ctx, &mut rng).await;

        let tags: Vec<_> = report.requests.iter().map(|r| r.tag).collect();
        assert_eq!(
            tags,
            [RequestTag::Auth, RequestTag::Menu, RequestTag::Search, RequestTag::Order]
        );
        assert!(report.requests.iter().all(|r| r.status == 0));
        assert_eq!(report.checks.len(), 8);
        // latency checks can still pass on a fast connection refusal
        assert!(report.failed_checks() >= 5);

        let metrics = collector.get_snapshot();
        assert_eq!(metrics.requests.total, 4);
        assert_eq!(metrics.requests.failed, 4);
        assert_eq!(metrics.checks.len(), 8);
    }
}
