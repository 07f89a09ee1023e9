use std::fmt;

use crate::config::llm_provider::LlmProvider;

/// Configuration for a structured-generation model.
///
/// # Fields
///
/// - `provider`: Which backend to call (Gemini, OpenAI).
/// - `model`: The model identifier (e.g., `"gemini-2.5-flash"`).
/// - `endpoint`: Base URL of the API; the client appends provider paths.
/// - `api_key`: Credential; `None` means the deployment is misconfigured and
///   [`crate::connect`] will refuse to build a client.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Bounded wait for a single upstream call.
/// - `web_search`: Lets the provider ground answers with web search (Gemini only).
///
/// `Debug` masks the API key.
#[derive(Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub web_search: bool,
}

/// Timeout used when `timeout_secs` is not set.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl LlmModelConfig {
    /// Provider defaults with no credential attached.
    pub fn for_provider(provider: LlmProvider) -> Self {
        Self {
            provider,
            model: provider.default_model().to_string(),
            endpoint: provider.default_endpoint().to_string(),
            api_key: None,
            max_tokens: None,
            temperature: Some(0.2),
            top_p: None,
            timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            web_search: false,
        }
    }

    /// Effective timeout in seconds.
    pub fn timeout_secs_or_default(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Whether a non-blank API key is present.
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl fmt::Debug for LlmModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmModelConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .field("web_search", &self.web_search)
            .finish()
    }
}
