use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot create tests directory {path}: {source}")]
    TestsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact for {0} has no code to persist")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, RepairError>;
