use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid coverage report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid PYTHONPATH entry: {0}")]
    PythonPath(String),
}

pub type Result<T> = std::result::Result<T, CoverageError>;
