//! Model config loaded from environment variables.
//!
//! # Environment variables
//!
//! - `LLM_PROVIDER`      = `gemini` (default) or `openai`
//! - `GEMINI_API_KEY` / `OPENAI_API_KEY` = credential for the selected provider
//! - `LLM_MODEL`         = model id (provider default when unset)
//! - `LLM_ENDPOINT`      = base URL (provider default when unset)
//! - `LLM_TIMEOUT_SECS`  = bounded wait per call (u64, default 30)
//! - `LLM_MAX_TOKENS`    = optional max output tokens (u32)
//! - `LLM_TEMPERATURE`   = optional temperature (0.0..=2.0, default 0.2)
//! - `LLM_WEB_SEARCH`    = enable search grounding (bool, default false)
//!
//! A missing API key is **not** an error here: the service still starts and
//! reports a configuration error per request, so the caller always gets JSON.

use tracing::{info, warn};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        ConfigError, Lookup, Result, env_flag, env_opt, env_opt_f32, env_opt_u32, env_opt_u64,
        validate_http_endpoint, validate_range_f32,
    },
};

/// Loads the model config from the process environment.
///
/// # Errors
/// See [`config_from_lookup`].
pub fn config_from_env() -> Result<LlmModelConfig> {
    config_from_lookup(&|name: &str| std::env::var(name).ok())
}

/// Loads the model config through an arbitrary variable lookup.
///
/// # Errors
///
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_PROVIDER`
/// - [`ConfigError::InvalidFormat`] for a non-http(s) `LLM_ENDPOINT` or bad flag
/// - [`ConfigError::InvalidNumber`] / [`ConfigError::OutOfRange`] for numeric knobs
/// - [`ConfigError::EmptyModel`] if `LLM_MODEL` is set to whitespace only
pub fn config_from_lookup(lookup: Lookup<'_>) -> Result<LlmModelConfig> {
    let provider = match env_opt(lookup, "LLM_PROVIDER") {
        Some(v) => v.parse::<LlmProvider>()?,
        None => LlmProvider::Gemini,
    };

    let mut cfg = LlmModelConfig::for_provider(provider);

    if let Some(raw) = lookup("LLM_MODEL") {
        let model = raw.trim();
        if model.is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        cfg.model = model.to_string();
    }

    if let Some(endpoint) = env_opt(lookup, "LLM_ENDPOINT") {
        validate_http_endpoint("LLM_ENDPOINT", &endpoint)?;
        cfg.endpoint = endpoint.trim_end_matches('/').to_string();
    }

    cfg.api_key = env_opt(lookup, provider.api_key_var());

    if let Some(secs) = env_opt_u64(lookup, "LLM_TIMEOUT_SECS")? {
        if secs == 0 {
            return Err(ConfigError::OutOfRange {
                field: "LLM_TIMEOUT_SECS",
                detail: "expected at least 1 second",
            }
            .into());
        }
        cfg.timeout_secs = Some(secs);
    }

    cfg.max_tokens = env_opt_u32(lookup, "LLM_MAX_TOKENS")?;

    if let Some(t) = env_opt_f32(lookup, "LLM_TEMPERATURE")? {
        validate_range_f32("LLM_TEMPERATURE", t, 0.0, 2.0)?;
        cfg.temperature = Some(t);
    }

    cfg.web_search = env_flag(lookup, "LLM_WEB_SEARCH", false)?;

    // Key presence and length only; never the value.
    match cfg.api_key.as_deref() {
        Some(key) => info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            key_len = key.len(),
            timeout_secs = cfg.timeout_secs_or_default(),
            web_search = cfg.web_search,
            "LLM config loaded"
        ),
        None => warn!(
            provider = %cfg.provider,
            var = provider.api_key_var(),
            "LLM API key not set; requests will fail with a configuration error"
        ),
    }

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error_handler::AiLlmError;

    fn load(vars: &[(&str, &str)]) -> Result<LlmModelConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config_from_lookup(&move |name: &str| map.get(name).cloned())
    }

    #[test]
    fn defaults_to_gemini_without_key() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.provider, LlmProvider::Gemini);
        assert_eq!(cfg.model, "gemini-2.5-flash");
        assert_eq!(cfg.endpoint, "https://generativelanguage.googleapis.com");
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.timeout_secs, Some(30));
        assert!(!cfg.web_search);
    }

    #[test]
    fn reads_provider_specific_key() {
        let cfg = load(&[
            ("LLM_PROVIDER", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("GEMINI_API_KEY", "ignored"),
            ("LLM_ENDPOINT", "http://localhost:8080/"),
            ("LLM_TIMEOUT_SECS", "5"),
            ("LLM_WEB_SEARCH", "true"),
        ])
        .unwrap();
        assert_eq!(cfg.provider, LlmProvider::OpenAI);
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.endpoint, "http://localhost:8080");
        assert_eq!(cfg.timeout_secs, Some(5));
        assert!(cfg.web_search);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("LLM_PROVIDER", "cohere")]),
            Err(AiLlmError::Config(ConfigError::UnsupportedProvider(_)))
        ));
        assert!(matches!(
            load(&[("LLM_ENDPOINT", "ftp://example.com")]),
            Err(AiLlmError::Config(ConfigError::InvalidFormat { .. }))
        ));
        assert!(matches!(
            load(&[("LLM_TEMPERATURE", "3.5")]),
            Err(AiLlmError::Config(ConfigError::OutOfRange { .. }))
        ));
        assert!(matches!(
            load(&[("LLM_TIMEOUT_SECS", "0")]),
            Err(AiLlmError::Config(ConfigError::OutOfRange { .. }))
        ));
        assert!(matches!(
            load(&[("LLM_MODEL", "  ")]),
            Err(AiLlmError::Config(ConfigError::EmptyModel))
        ));
    }
}
