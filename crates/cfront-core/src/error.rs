//! Error types for configuration loading and architecture lookup

use thiserror::Error;

/// cfront core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown architecture: {0}")]
    UnknownArchitecture(String),
}

/// Result type alias for cfront core
pub type Result<T> = std::result::Result<T, Error>;
