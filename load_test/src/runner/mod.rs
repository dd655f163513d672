// Runner module
// Stage-driven virtual-user scheduling

pub mod ramping_vus;

pub use ramping_vus::{execute, RunOutcome};
