use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("unknown test category: {0}")]
    UnknownCategory(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PromptError>;
