use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fasttech_load_test::cli::{Cli, Mode};
use fasttech_load_test::config::run::parse_extra_thresholds;
use fasttech_load_test::config::{default_thresholds, get_load_profile, RunConfig};
use fasttech_load_test::metrics::reporter;
use fasttech_load_test::scenarios::food_ordering;

/// Exit status when the run completed but at least one threshold failed
const THRESHOLDS_FAILED_EXIT_CODE: i32 = 99;

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    match cli.mode {
        Mode::Run(args) => {
            init_tracing(args.verbose)?;

            let config = RunConfig::from_args(&args).context("Invalid run configuration")?;

            tracing::info!("FastTech Load Test Starting...");
            tracing::info!("Auth:   {}", config.endpoints.auth);
            tracing::info!("Menu:   {}", config.endpoints.menu);
            tracing::info!("Search: {}", config.endpoints.search);
            tracing::info!("Order:  {}", config.endpoints.order);
            tracing::info!(
                "Profile: {} ({}s, peak {} VUs)",
                config.profile.name,
                config.profile.total_duration().as_secs(),
                config.profile.peak_vus()
            );
            if config.think_time_scale != 1.0 {
                tracing::info!("Think time scale: {}", config.think_time_scale);
            }

            let summary = food_ordering::run(config).await?;

            if !summary.thresholds_passed {
                tracing::error!("Some thresholds have been crossed");
                std::process::exit(THRESHOLDS_FAILED_EXIT_CODE);
            }

            tracing::info!("Load test complete");
        }

        Mode::Plan(args) => {
            init_tracing(args.verbose)?;

            let profile = get_load_profile(&args.profile);
            let mut thresholds = default_thresholds();
            thresholds.extend(parse_extra_thresholds(&args.thresholds)?);

            reporter::print_plan(&profile, &thresholds);
        }
    }

    Ok(())
}
