//! Generation config loaded from environment variables, with defaults.
//!
//! # Environment variables
//!
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (default `http://localhost:11434`)
//! - `OLLAMA_MODEL`                = model tag (default `codellama:latest`)
//! - `LLM_TEMPERATURE`             = sampling temperature (default `0.2`)
//! - `LLM_MAX_TOKENS`              = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS`            = request timeout (default `600`)

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{ConfigError, Result, parse_opt, validate_http_endpoint, validate_range_f32},
};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "codellama:latest";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.trim().is_empty())
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. [`DEFAULT_OLLAMA_URL`]
///
/// # Errors
///
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
/// - [`ConfigError::InvalidFormat`] if `OLLAMA_URL` has no http(s) scheme
fn ollama_endpoint<F>(var: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = non_empty(var("OLLAMA_URL")) {
        let url = url.trim().to_string();
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    let port = non_empty(var("OLLAMA_PORT"));
    match parse_opt::<u16>("OLLAMA_PORT", port.as_deref(), "expected u16 (1..=65535)")? {
        Some(port) => Ok(format!("http://localhost:{port}")),
        None => Ok(DEFAULT_OLLAMA_URL.to_string()),
    }
}

/// Builds the generation config from an arbitrary variable lookup.
pub fn config_from<F>(var: F) -> Result<LlmModelConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let endpoint = ollama_endpoint(&var)?;
    let model = match var("OLLAMA_MODEL") {
        Some(m) if m.trim().is_empty() => return Err(ConfigError::EmptyModel.into()),
        Some(m) => m.trim().to_string(),
        None => DEFAULT_OLLAMA_MODEL.to_string(),
    };

    let temperature = parse_opt::<f32>("LLM_TEMPERATURE", var("LLM_TEMPERATURE").as_deref(), "expected f32")?
        .unwrap_or(DEFAULT_TEMPERATURE);
    validate_range_f32("temperature", temperature, 0.0, 2.0)?;

    let max_tokens = parse_opt::<u32>("LLM_MAX_TOKENS", var("LLM_MAX_TOKENS").as_deref(), "expected u32")?;
    let timeout_secs = parse_opt::<u64>("LLM_TIMEOUT_SECS", var("LLM_TIMEOUT_SECS").as_deref(), "expected u64")?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(LlmModelConfig {
        model,
        endpoint,
        max_tokens,
        temperature: Some(temperature),
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}

/// Constructs the generation config from the process environment.
///
/// # Defaults
/// - `temperature = Some(0.2)`
/// - `timeout_secs = Some(600)`
pub fn config_ollama_generation() -> Result<LlmModelConfig> {
    config_from(|k| std::env::var(k).ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::AiLlmError;

    fn cfg(pairs: &[(&str, &str)]) -> Result<LlmModelConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config_from(move |k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let c = cfg(&[]).unwrap();
        assert_eq!(c.endpoint, DEFAULT_OLLAMA_URL);
        assert_eq!(c.model, DEFAULT_OLLAMA_MODEL);
        assert_eq!(c.temperature, Some(0.2));
        assert_eq!(c.max_tokens, None);
        assert_eq!(c.timeout_secs, Some(600));
    }

    #[test]
    fn url_wins_over_port() {
        let c = cfg(&[("OLLAMA_URL", "http://gpu:11434"), ("OLLAMA_PORT", "1")]).unwrap();
        assert_eq!(c.endpoint, "http://gpu:11434");
        let c = cfg(&[("OLLAMA_PORT", "8080")]).unwrap();
        assert_eq!(c.endpoint, "http://localhost:8080");
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for pairs in [
            vec![("OLLAMA_PORT", "99999")],
            vec![("OLLAMA_URL", "gpu:11434")],
            vec![("LLM_MAX_TOKENS", "many")],
            vec![("LLM_TEMPERATURE", "7.5")],
            vec![("OLLAMA_MODEL", " ")],
        ] {
            assert!(matches!(cfg(&pairs), Err(AiLlmError::Config(_))), "{pairs:?}");
        }
    }
}
