use std::time::Duration;

use ai_llm_service::{AiLlmError, ProviderError, ProviderErrorKind};
use thiserror::Error;

/// Failure kinds of a concierge invocation.
///
/// `InvalidRequest` is the caller's fault; everything else is server-side and
/// is reported with a short summary plus a diagnostic string.
#[derive(Debug, Error)]
pub enum ConciergeError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Deployment misconfiguration (missing key, unreadable knowledge file, ...).
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Network failure or non-success status from the generation service.
    #[error("upstream transport failure: {summary}: {details}")]
    UpstreamTransportFailure { summary: String, details: String },

    /// The service answered 2xx, but the payload breaks the JSON contract.
    #[error("malformed upstream response: {0}")]
    UpstreamMalformed(String),

    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),
}

impl ConciergeError {
    /// Stable, human-readable summary for the `error` field of HTTP bodies.
    pub fn summary(&self) -> &'static str {
        match self {
            ConciergeError::InvalidRequest(_) => "Invalid request",
            ConciergeError::ConfigurationMissing(_) => "Configuration or Initialization Error",
            ConciergeError::UpstreamTransportFailure { .. } => {
                "Upstream generation service error"
            }
            ConciergeError::UpstreamMalformed(_) => "Malformed response from generation service",
            ConciergeError::Timeout(_) => "Upstream generation service timed out",
        }
    }

    /// Diagnostic text for the `details` field of HTTP bodies.
    pub fn details(&self) -> String {
        match self {
            ConciergeError::InvalidRequest(msg)
            | ConciergeError::ConfigurationMissing(msg)
            | ConciergeError::UpstreamMalformed(msg) => msg.clone(),
            ConciergeError::UpstreamTransportFailure { details, .. } => details.clone(),
            ConciergeError::Timeout(after) => {
                format!("no answer from the generation service within {after:?}")
            }
        }
    }
}

impl From<AiLlmError> for ConciergeError {
    fn from(err: AiLlmError) -> Self {
        let upstream = err.upstream_message().map(str::to_owned);
        match err {
            AiLlmError::Config(e) => ConciergeError::ConfigurationMissing(e.to_string()),
            AiLlmError::Timeout(after) => ConciergeError::Timeout(after),
            AiLlmError::HttpTransport(e) => ConciergeError::UpstreamTransportFailure {
                summary: "transport error".into(),
                details: e.to_string(),
            },
            AiLlmError::Provider(ProviderError { provider, kind }) => match kind {
                ProviderErrorKind::HttpStatus(http) => ConciergeError::UpstreamTransportFailure {
                    summary: format!("{provider} returned HTTP {}", http.status.as_u16()),
                    details: upstream.unwrap_or(http.snippet),
                },
                ProviderErrorKind::EmptyCandidates => ConciergeError::UpstreamMalformed(format!(
                    "{provider} returned no candidate content"
                )),
                ProviderErrorKind::Decode(reason) => {
                    ConciergeError::UpstreamMalformed(format!("{provider}: {reason}"))
                }
                ProviderErrorKind::InvalidEndpoint(ep) => ConciergeError::ConfigurationMissing(
                    format!("invalid {provider} endpoint: {ep}"),
                ),
                other => ConciergeError::ConfigurationMissing(format!("{provider}: {other}")),
            },
            other => ConciergeError::UpstreamTransportFailure {
                summary: "generation service error".into(),
                details: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use ai_llm_service::{ConfigError, LlmProvider, error_handler::HttpError};
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn http_status_keeps_upstream_message() {
        let err = ConciergeError::from(AiLlmError::from(ProviderError::new(
            LlmProvider::Gemini,
            ProviderErrorKind::HttpStatus(HttpError {
                status: StatusCode::FORBIDDEN,
                url: "https://example.test/v1beta/models/m:generateContent".into(),
                snippet: "{\"error\":{...}}".into(),
                message: Some("API key not valid.".into()),
            }),
        )));

        match &err {
            ConciergeError::UpstreamTransportFailure { summary, details } => {
                assert_eq!(summary, "gemini returned HTTP 403");
                assert_eq!(details, "API key not valid.");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(err.details(), "API key not valid.");
    }

    #[test]
    fn http_status_without_message_uses_snippet() {
        let err = ConciergeError::from(AiLlmError::from(ProviderError::new(
            LlmProvider::OpenAI,
            ProviderErrorKind::HttpStatus(HttpError {
                status: StatusCode::BAD_GATEWAY,
                url: "https://example.test/v1/chat/completions".into(),
                snippet: "<html>bad gateway</html>".into(),
                message: None,
            }),
        )));
        assert_eq!(err.details(), "<html>bad gateway</html>");
    }

    #[test]
    fn config_and_decode_map_to_distinct_kinds() {
        let missing = ConciergeError::from(AiLlmError::from(ConfigError::MissingVar(
            "GEMINI_API_KEY",
        )));
        assert!(matches!(missing, ConciergeError::ConfigurationMissing(ref m) if m.contains("GEMINI_API_KEY")));

        let empty = ConciergeError::from(AiLlmError::from(ProviderError::new(
            LlmProvider::OpenAI,
            ProviderErrorKind::EmptyCandidates,
        )));
        assert!(matches!(empty, ConciergeError::UpstreamMalformed(_)));
    }
}
