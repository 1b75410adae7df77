/// Configuration for Ollama generation calls.
///
/// # Fields
///
/// - `model`: Ollama model tag (e.g., `"codellama:latest"`).
/// - `endpoint`: Base URL of the Ollama server.
/// - `max_tokens`: Maximum number of tokens to generate (`num_predict`).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Request timeout in seconds.
///
/// # Examples
///
/// ```
/// use ai_llm_service::LlmModelConfig;
///
/// let cfg = LlmModelConfig {
///     model: "codellama:latest".to_string(),
///     endpoint: "http://localhost:11434".to_string(),
///     max_tokens: Some(1024),
///     temperature: Some(0.2),
///     top_p: None,
///     timeout_secs: Some(600),
/// };
/// assert_eq!(cfg.model, "codellama:latest");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Model identifier string.
    pub model: String,

    /// Ollama base URL.
    pub endpoint: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
