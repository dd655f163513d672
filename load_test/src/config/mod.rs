// Configuration module
// Endpoints, load profiles, thresholds and the validated run configuration

pub mod endpoints;
pub mod load_profiles;
pub mod run;
pub mod thresholds;

pub use endpoints::Endpoints;
pub use load_profiles::{get_load_profile, LoadProfile, Stage};
pub use run::RunConfig;
pub use thresholds::{default_thresholds, Threshold};
