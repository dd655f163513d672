//! Console reporter for metrics with real-time updates

use std::io::{self, Write};

use tokio::time::{interval, Duration};

use super::collector::{LatencyStats, MetricsCollector};
use super::thresholds::ThresholdResult;
use crate::config::load_profiles::LoadProfile;
use crate::config::thresholds::Threshold;
use crate::http::RequestTag;

/// Start periodic metrics reporting
pub async fn start_periodic_reporter(collector: MetricsCollector, every: Duration) {
    let mut ticker = interval(every);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;

        // Update system metrics before printing
        collector.update_system_metrics();

        print_live_metrics(&collector);
    }
}

fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn format_rate(rate: Option<f64>) -> String {
    rate.map(|r| format!("{:.2}%", r * 100.0))
        .unwrap_or_else(|| "-".to_string())
}

/// Print live metrics (clears screen and updates in place)
pub fn print_live_metrics(collector: &MetricsCollector) {
    // Clear screen and move cursor to top
    print!("\x1B[2J\x1B[1;1H");

    let metrics = collector.get_snapshot();
    let elapsed = collector.elapsed_seconds();

    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║             FastTech Load Test - Live Metrics                  ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    println!("\n⏱️  Elapsed Time: {}", format_elapsed(elapsed));

    println!("\n┌─ VIRTUAL USERS ─────────────────────────────────────────────┐");
    println!(
        "│  Active:       {:>8}    Max:        {:>8}              │",
        metrics.vus.active, metrics.vus.max
    );
    println!(
        "│  Iterations:   {:>8}                                      │",
        metrics.iterations
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n┌─ REQUESTS ──────────────────────────────────────────────────┐");
    let throughput = if elapsed > 0 {
        metrics.requests.total as f64 / elapsed as f64
    } else {
        0.0
    };
    println!(
        "│  Total:        {:>8}    Failed:     {:>8}              │",
        metrics.requests.total, metrics.requests.failed
    );
    println!(
        "│  Fail Rate:    {:>8}    Throughput: {:>7.2}/sec        │",
        format_rate(metrics.requests.failure_rate()),
        throughput
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n┌─ LATENCY BY SERVICE (ms) ───────────────────────────────────┐");
    for tag in RequestTag::ALL {
        match collector.request_latency_stats(Some(tag)) {
            Some(stats) => println!(
                "│  {:<7} P50: {:>8.1}  P95: {:>8.1}  Max: {:>8.1}  n={:<6}│",
                tag.as_str(),
                stats.med,
                stats.p95,
                stats.max,
                stats.count
            ),
            None => println!("│  {:<7} no requests yet                                     │", tag.as_str()),
        }
    }
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n┌─ CHECKS ────────────────────────────────────────────────────┐");
    let (passes, fails) = metrics.check_totals();
    println!(
        "│  Passed:       {:>8}    Failed:     {:>8}              │",
        passes, fails
    );
    println!(
        "│  Pass Rate:    {:>8}                                      │",
        format_rate(metrics.check_pass_rate())
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n┌─ SYSTEM ────────────────────────────────────────────────────┐");
    println!(
        "│  CPU Usage:    {:>6.1}%    Memory: {:>6} / {:>6} MB       │",
        metrics.system.cpu_usage, metrics.system.memory_used_mb, metrics.system.memory_total_mb
    );
    println!("└─────────────────────────────────────────────────────────────┘");

    println!("\n  [Press Ctrl+C to stop test]");

    // Flush stdout to ensure immediate display
    let _ = io::stdout().flush();
}

fn print_latency_block(title: &str, stats: &LatencyStats) {
    println!("\n📈 {}", title);
    println!("   Min:                  {:>10.2} ms", stats.min);
    println!("   P50 (Median):         {:>10.2} ms", stats.med);
    println!("   P90:                  {:>10.2} ms", stats.p90);
    println!("   P95:                  {:>10.2} ms", stats.p95);
    println!("   P99:                  {:>10.2} ms", stats.p99);
    println!("   Max:                  {:>10.2} ms", stats.max);
    println!("   Mean:                 {:>10.2} ms", stats.mean);
}

/// Print final summary report
pub fn print_final_report(collector: &MetricsCollector, thresholds: &[ThresholdResult]) {
    let metrics = collector.get_snapshot();
    let elapsed = collector.elapsed().as_secs_f64();

    println!("\n╔════════════════════════════════════════════════════════════════╗");
    println!("║                    FINAL TEST REPORT                           ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    println!("\n👥 VIRTUAL USERS");
    println!("   Max VUs:              {:>10}", metrics.vus.max);
    println!("   Iterations:           {:>10}", metrics.iterations);
    if let Some(stats) = collector.iteration_latency_stats() {
        println!("   Iteration Mean:       {:>10.2} ms", stats.mean);
    }

    println!("\n📊 REQUESTS");
    println!("   Total:                {:>10}", metrics.requests.total);
    println!("   Failed:               {:>10}", metrics.requests.failed);
    println!(
        "   Failure Rate:         {:>10}",
        format_rate(metrics.requests.failure_rate())
    );
    println!(
        "   Data Received:        {:>10.2} MB",
        metrics.requests.bytes_received as f64 / 1024.0 / 1024.0
    );
    if elapsed > 0.0 {
        println!(
            "   Throughput:           {:>10.2} req/sec",
            metrics.requests.total as f64 / elapsed
        );
    }

    if let Some(stats) = collector.request_latency_stats(None) {
        print_latency_block("REQUEST DURATION (all services)", &stats);
    }

    for tag in RequestTag::ALL {
        let counts = collector.request_counts(Some(tag));
        if counts.total == 0 {
            continue;
        }
        println!(
            "\n🔖 {} - {} requests, {} failed",
            tag.as_str().to_uppercase(),
            counts.total,
            counts.failed
        );
        if let Some(stats) = collector.request_latency_stats(Some(tag)) {
            println!(
                "   P50: {:>8.2} ms   P90: {:>8.2} ms   P95: {:>8.2} ms   Max: {:>8.2} ms",
                stats.med, stats.p90, stats.p95, stats.max
            );
        }
    }

    if !metrics.checks.is_empty() {
        println!("\n✅ CHECKS");
        for check in &metrics.checks {
            let mark = if check.fails == 0 { "✓" } else { "✗" };
            println!(
                "   {} {:<34} {:>8} passed {:>8} failed ({})",
                mark,
                check.name,
                check.passes,
                check.fails,
                format_rate(check.pass_rate())
            );
        }
    }

    if !thresholds.is_empty() {
        println!("\n🎯 THRESHOLDS");
        for result in thresholds {
            let mark = if result.passed { "✓" } else { "✗" };
            let observed = result
                .observed
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "no data".to_string());
            println!(
                "   {} {:<34} {:<12} observed {}",
                mark, result.metric, result.condition, observed
            );
        }
    }

    println!("\n⏱️  Test Duration: {:.2} seconds", elapsed);
    println!("════════════════════════════════════════════════════════════════\n");
}

/// Print the load profile and thresholds of a run without executing it
pub fn print_plan(profile: &LoadProfile, thresholds: &[Threshold]) {
    println!("\n📋 LOAD PROFILE: {}", profile.name);

    let mut offset = Duration::ZERO;
    for (idx, stage) in profile.stages.iter().enumerate() {
        println!(
            "   Stage {}: {:>6}s → {:>4} VUs   (from {}s)",
            idx + 1,
            stage.duration.as_secs(),
            stage.target,
            offset.as_secs()
        );
        offset += stage.duration;
    }
    println!(
        "   Total: {}s, peak {} VUs, graceful stop {}s",
        profile.total_duration().as_secs(),
        profile.peak_vus(),
        profile.graceful_stop.as_secs()
    );

    println!("\n🎯 THRESHOLDS");
    for threshold in thresholds {
        println!("   {}", threshold);
    }
    println!();
}
