use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("docs root does not exist: {0}")]
    MissingRoot(PathBuf),
}

pub type Result<T> = std::result::Result<T, DocError>;
