mod args;

pub use args::{Cli, Mode, PlanArgs, RunArgs};
