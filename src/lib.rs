pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod ffmpeg;
pub mod filters;
pub mod media;
pub mod planner;
pub mod runner;
pub mod tui;

pub use config::{GlobalConfig, OutputFormat, Quality};
pub use error::{Error, Result};
pub use planner::{plan, ConvertPlan};
pub use runner::{run_job, Job, JobOutcome};
