use std::path::PathBuf;
use thiserror::Error;

/// A trial list that must not be allowed to start
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("trial \"{trial}\" will never end: set total_image_time or post_first_look_window")]
    NeverEnds { trial: String },

    #[error("trial name must not be empty")]
    EmptyName,

    #[error("trial name \"{trial}\" is used more than once")]
    DuplicateName { trial: String },

    #[error("no trials configured")]
    NoTrials,

    #[error("failed to read trial file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse trial file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unsupported trial file format: {path} (expected .toml or .json)")]
    UnsupportedFormat { path: PathBuf },
}
