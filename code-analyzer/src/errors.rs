use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tree-sitter language error")]
    TreeSitterLanguage,

    #[error("tree-sitter parse error")]
    TreeSitterParse,

    /// The module parsed with ERROR/MISSING nodes.
    #[error("syntax error at line {line}, column {column}: {detail}")]
    Syntax {
        line: usize,
        column: usize,
        detail: String,
    },

    #[error("root path does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("invalid ignore glob `{pattern}`: {reason}")]
    InvalidGlob { pattern: String, reason: String },
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
