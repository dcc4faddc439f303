//! Errors raised while preparing and running a parse

use std::path::PathBuf;
use thiserror::Error;

use crate::backend::{ConfigError, ParseError};

/// Parser front-end error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("no target paths specified")]
    NoTargetPaths,

    #[error(
        "file specified but not found: {} (include paths: {})",
        .path.display(),
        join_paths(.include_paths)
    )]
    FileNotFound {
        path: PathBuf,
        include_paths: Vec<PathBuf>,
    },

    #[error("custom defines file provided but can't be read: {}", .path.display())]
    CustomDefines {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot determine working directory: {0}")]
    WorkDir(#[source] std::io::Error),

    #[error("invalid parse configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Result type alias for the parser front-end
pub type Result<T> = std::result::Result<T, Error>;

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
