//! Generation-service client.
//!
//! A thin Ollama `/api/generate` client ([`OllamaService`]) configured from
//! the environment ([`config::default_config::config_ollama_generation`]).

pub mod config;
pub mod error_handler;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{AiLlmError, ConfigError, Result};
pub use services::ollama_service::{OllamaError, OllamaService};
