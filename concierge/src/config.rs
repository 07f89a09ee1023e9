//! Concierge configuration, loaded once at process start.
//!
//! On top of the LLM variables read by
//! [`ai_llm_service::config::default_config`]:
//!
//! - `KNOWLEDGE_BASE_PATH`       = file with the default knowledge document
//! - `KNOWLEDGE_BASE_BUILTIN`    = use the built-in document when no path is set (default true)
//! - `CONCIERGE_FALLBACK_PHRASE` = reply for out-of-scope questions

use std::path::PathBuf;

use ai_llm_service::{
    LlmModelConfig,
    config::default_config::config_from_lookup,
    error_handler::{Lookup, Result, env_flag, env_opt},
};

use crate::{knowledge::KnowledgeSource, prompt::DEFAULT_FALLBACK_PHRASE};

#[derive(Debug, Clone)]
pub struct ConciergeConfig {
    pub llm: LlmModelConfig,
    pub knowledge: KnowledgeSource,
    pub fallback_phrase: String,
}

impl ConciergeConfig {
    /// Reads the process environment.
    ///
    /// # Errors
    /// Malformed values (see [`config_from_lookup`]); a missing API key is not one.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|name: &str| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: Lookup<'_>) -> Result<Self> {
        let llm = config_from_lookup(lookup)?;

        let knowledge = match env_opt(lookup, "KNOWLEDGE_BASE_PATH") {
            Some(path) => KnowledgeSource::File(PathBuf::from(path)),
            None if env_flag(lookup, "KNOWLEDGE_BASE_BUILTIN", true)? => KnowledgeSource::Builtin,
            None => KnowledgeSource::Disabled,
        };

        let fallback_phrase = env_opt(lookup, "CONCIERGE_FALLBACK_PHRASE")
            .unwrap_or_else(|| DEFAULT_FALLBACK_PHRASE.to_string());

        Ok(Self {
            llm,
            knowledge,
            fallback_phrase,
        })
    }

    /// Config with the given LLM settings, the built-in document and the default phrase.
    pub fn with_llm(llm: LlmModelConfig) -> Self {
        Self {
            llm,
            knowledge: KnowledgeSource::Builtin,
            fallback_phrase: DEFAULT_FALLBACK_PHRASE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_source_precedence() {
        let with_path = |name: &str| match name {
            "KNOWLEDGE_BASE_PATH" => Some("/srv/kb.txt".to_string()),
            "KNOWLEDGE_BASE_BUILTIN" => Some("false".to_string()),
            _ => None,
        };
        let cfg = ConciergeConfig::from_lookup(&with_path).unwrap();
        assert_eq!(cfg.knowledge, KnowledgeSource::File(PathBuf::from("/srv/kb.txt")));

        let disabled = |name: &str| match name {
            "KNOWLEDGE_BASE_BUILTIN" => Some("0".to_string()),
            _ => None,
        };
        let cfg = ConciergeConfig::from_lookup(&disabled).unwrap();
        assert_eq!(cfg.knowledge, KnowledgeSource::Disabled);

        let cfg = ConciergeConfig::from_lookup(&|_: &str| None::<String>).unwrap();
        assert_eq!(cfg.knowledge, KnowledgeSource::Builtin);
        assert_eq!(cfg.fallback_phrase, DEFAULT_FALLBACK_PHRASE);
    }

    #[test]
    fn fallback_phrase_is_configurable() {
        let lookup = |name: &str| {
            (name == "CONCIERGE_FALLBACK_PHRASE").then(|| "Not in the brand book.".to_string())
        };
        let cfg = ConciergeConfig::from_lookup(&lookup).unwrap();
        assert_eq!(cfg.fallback_phrase, "Not in the brand book.");
    }
}
