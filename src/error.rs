use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Setup errors raised before any job runs. Jobs themselves never fail with
/// an `Error`; they always end in a [`crate::runner::JobOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read config file {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown quality `{0}` (expected extreme, high, medium or custom)")]
    UnknownQuality(String),

    #[error("cannot read input directory {}: {source}", path.display())]
    ReadInputDir {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("cannot start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),
}
