use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::endpoints::{
    DEFAULT_AUTH_URL, DEFAULT_MENU_URL, DEFAULT_ORDER_URL, DEFAULT_SEARCH_URL,
};

/// FastTech Load Testing Tool
#[derive(Parser, Debug)]
#[command(name = "fasttech-load-test")]
#[command(about = "Staged load test for the FastTech auth, menu, search and order services")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Mode {
    /// Run the food-ordering scenario against the configured services
    Run(RunArgs),

    /// Print the load profile and thresholds without sending any traffic
    Plan(PlanArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Auth service login endpoint
    #[arg(long, default_value = DEFAULT_AUTH_URL, env = "FASTTECH_AUTH_URL")]
    pub auth_url: String,

    /// Menu service item creation endpoint
    #[arg(long, default_value = DEFAULT_MENU_URL, env = "FASTTECH_MENU_URL")]
    pub menu_url: String,

    /// Search service query endpoint (including the query string)
    #[arg(long, default_value = DEFAULT_SEARCH_URL, env = "FASTTECH_SEARCH_URL")]
    pub search_url: String,

    /// Order service endpoint
    #[arg(long, default_value = DEFAULT_ORDER_URL, env = "FASTTECH_ORDER_URL")]
    pub order_url: String,

    /// Load profile: stress, smoke, soak
    #[arg(
        long,
        default_value = "stress",
        env = "FASTTECH_PROFILE",
        value_parser = ["stress", "smoke", "soak"]
    )]
    pub profile: String,

    /// Multiplier applied to every think-time pause (0 disables pauses)
    #[arg(long, default_value = "1.0")]
    pub think_time_scale: f64,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "60")]
    pub request_timeout: u64,

    /// Live metrics refresh interval in seconds (0 disables the live view)
    #[arg(long, default_value = "5")]
    pub report_interval: u64,

    /// Write the end-of-test summary as JSON to this path
    #[arg(long)]
    pub summary_export: Option<PathBuf>,

    /// Seed for payload and think-time randomness
    #[arg(long)]
    pub seed: Option<u64>,

    /// Extra threshold as SELECTOR=CONDITION, e.g. 'http_req_duration{name:auth}=p(99)<1500'
    #[arg(long = "threshold", value_name = "SELECTOR=CONDITION")]
    pub thresholds: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// Load profile: stress, smoke, soak
    #[arg(
        long,
        default_value = "stress",
        env = "FASTTECH_PROFILE",
        value_parser = ["stress", "smoke", "soak"]
    )]
    pub profile: String,

    /// Extra threshold as SELECTOR=CONDITION
    #[arg(long = "threshold", value_name = "SELECTOR=CONDITION")]
    pub thresholds: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
