//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested types ([`ConfigError`],
//! [`ProviderError`]). Small helpers for reading/validating configuration values
//! are provided and return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::llm_provider::LlmProvider;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
///
/// Callers usually care about four situations: the deployment is
/// misconfigured, the provider answered with something unusable, the network
/// failed, or the call took too long.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup or first use).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider answered, but with a non-success status or an unusable body.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

impl AiLlmError {
    /// Maps a transport error, turning client-side timeouts into [`AiLlmError::Timeout`].
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            AiLlmError::Timeout(timeout)
        } else {
            AiLlmError::HttpTransport(err)
        }
    }

    /// Upstream-provided message, when the provider returned one.
    pub fn upstream_message(&self) -> Option<&str> {
        match self {
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::HttpStatus(http),
                ..
            }) => http.message.as_deref(),
            _ => None,
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_MAX_TOKENS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_PROVIDER`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `LLM_ENDPOINT`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range.
        detail: &'static str,
    },

    /// Model name was empty.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Non-success HTTP answer from a provider.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// HTTP status returned by the provider.
    pub status: StatusCode,
    /// Request URL (never contains credentials).
    pub url: String,
    /// Short, trimmed snippet of the response body.
    pub snippet: String,
    /// `error.message` from the provider's JSON error body, if any.
    pub message: Option<String>,
}

/// What went wrong while talking to a provider.
#[non_exhaustive]
#[derive(Debug)]
pub enum ProviderErrorKind {
    /// The config targets a different provider than the client being built.
    InvalidProvider,
    /// Upstream returned a non-successful HTTP status.
    HttpStatus(HttpError),
    /// Response envelope could not be decoded.
    Decode(String),
    /// Envelope decoded, but no candidate carried any text.
    EmptyCandidates,
    /// Endpoint is empty or does not start with http/https.
    InvalidEndpoint(String),
}

/// Provider-scoped error: which backend failed, and how.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider}: {kind}")]
pub struct ProviderError {
    pub provider: LlmProvider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: LlmProvider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderErrorKind::InvalidProvider => f.write_str("config is for a different provider"),
            ProviderErrorKind::HttpStatus(http) => {
                let detail = http.message.as_deref().unwrap_or(&http.snippet);
                write!(f, "HTTP {} from {}: {}", http.status, http.url, detail)
            }
            ProviderErrorKind::Decode(reason) => write!(f, "decode error: {reason}"),
            ProviderErrorKind::EmptyCandidates => {
                f.write_str("response contained no candidate text")
            }
            ProviderErrorKind::InvalidEndpoint(ep) => write!(f, "invalid endpoint: {ep}"),
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Body helpers                                                              */
/* ------------------------------------------------------------------------- */

const SNIPPET_MAX_CHARS: usize = 240;

/// Builds a single-line, length-capped snippet of an upstream body for logs/errors.
pub fn make_snippet(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_MAX_CHARS {
        flat
    } else {
        let mut s: String = flat.chars().take(SNIPPET_MAX_CHARS).collect();
        s.push('…');
        s
    }
}

/// Extracts `error.message` from a provider error body.
///
/// Both Gemini and OpenAI use `{ "error": { "message": "..." } }`.
pub fn upstream_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Lookup function used by the config loaders; `std::env::var` in production.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Reads a variable, treating empty/whitespace values as unset.
pub fn env_opt(lookup: Lookup<'_>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parses an optional `u32` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(lookup: Lookup<'_>, name: &'static str) -> Result<Option<u32>> {
    env_opt(lookup, name)
        .map(|v| {
            v.parse::<u32>().map_err(|_| {
                AiLlmError::from(ConfigError::InvalidNumber {
                    var: name,
                    reason: "expected u32",
                })
            })
        })
        .transpose()
}

/// Parses an optional `u64` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u64`.
pub fn env_opt_u64(lookup: Lookup<'_>, name: &'static str) -> Result<Option<u64>> {
    env_opt(lookup, name)
        .map(|v| {
            v.parse::<u64>().map_err(|_| {
                AiLlmError::from(ConfigError::InvalidNumber {
                    var: name,
                    reason: "expected u64",
                })
            })
        })
        .transpose()
}

/// Parses an optional `f32` (`Ok(None)` if unset/empty).
pub fn env_opt_f32(lookup: Lookup<'_>, name: &'static str) -> Result<Option<f32>> {
    env_opt(lookup, name)
        .map(|v| {
            v.parse::<f32>().map_err(|_| {
                AiLlmError::from(ConfigError::InvalidNumber {
                    var: name,
                    reason: "expected a decimal number",
                })
            })
        })
        .transpose()
}

/// Parses a boolean flag; accepts `1/0`, `true/false`, `yes/no`, `on/off`.
pub fn env_flag(lookup: Lookup<'_>, name: &'static str, default: bool) -> Result<bool> {
    match env_opt(lookup, name).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFormat {
                var: name,
                reason: "expected a boolean (true/false)",
            }
            .into()),
        },
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_message_from_error_body() {
        let body = r#"{"error":{"code":403,"message":"API key not valid.","status":"PERMISSION_DENIED"}}"#;
        assert_eq!(
            upstream_error_message(body).as_deref(),
            Some("API key not valid.")
        );
        assert_eq!(upstream_error_message("<html>nope</html>"), None);
    }

    #[test]
    fn snippet_is_flattened_and_capped() {
        let long = "a \n b ".repeat(200);
        let s = make_snippet(&long);
        assert!(!s.contains('\n'));
        assert!(s.chars().count() <= SNIPPET_MAX_CHARS + 1);
        assert!(s.ends_with('…'));
    }

    #[test]
    fn flags_and_numbers_parse() {
        let lookup = |name: &str| match name {
            "FLAG" => Some("Yes".to_string()),
            "NUM" => Some(" 42 ".to_string()),
            "BAD" => Some("forty".to_string()),
            _ => None,
        };
        assert!(env_flag(&lookup, "FLAG", false).unwrap());
        assert!(!env_flag(&lookup, "MISSING", false).unwrap());
        assert_eq!(env_opt_u64(&lookup, "NUM").unwrap(), Some(42));
        assert!(matches!(
            env_opt_u32(&lookup, "BAD"),
            Err(AiLlmError::Config(ConfigError::InvalidNumber { var: "BAD", .. }))
        ));
    }
}
