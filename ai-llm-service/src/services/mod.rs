//! Provider clients implementing [`GenerationClient`].

pub mod gemini_service;
pub mod open_ai_service;

use std::{sync::Arc, time::Duration};

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::error;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, HttpError, ProviderError, ProviderErrorKind, Result,
        make_snippet, upstream_error_message,
    },
    generation::GenerationClient,
    services::{gemini_service::GeminiService, open_ai_service::OpenAiService},
};

/// Builds the client matching `cfg.provider`.
///
/// # Errors
/// - [`ConfigError::MissingVar`] when no API key is configured
/// - [`ProviderErrorKind::InvalidEndpoint`] for a non-http(s) endpoint
/// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
pub fn connect(cfg: &LlmModelConfig) -> Result<Arc<dyn GenerationClient>> {
    match cfg.provider {
        LlmProvider::Gemini => Ok(Arc::new(GeminiService::new(cfg.clone())?)),
        LlmProvider::OpenAI => Ok(Arc::new(OpenAiService::new(cfg.clone())?)),
    }
}

/// Common constructor checks: provider match, API key present, http(s) endpoint.
/// Returns the key and the endpoint without a trailing slash.
fn validate(cfg: &LlmModelConfig, expected: LlmProvider) -> Result<(String, String)> {
    if cfg.provider != expected {
        return Err(ProviderError::new(expected, ProviderErrorKind::InvalidProvider).into());
    }

    let api_key = cfg
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(ConfigError::MissingVar(expected.api_key_var()))?
        .to_string();

    let endpoint = cfg.endpoint.trim();
    if endpoint.is_empty()
        || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ProviderError::new(
            expected,
            ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
        )
        .into());
    }

    Ok((api_key, endpoint.trim_end_matches('/').to_string()))
}

/// HTTP client with JSON content type, one sensitive auth header and a timeout.
fn build_client(
    provider: LlmProvider,
    auth_name: header::HeaderName,
    auth_value: &str,
    timeout: Duration,
) -> Result<reqwest::Client> {
    let mut auth = HeaderValue::from_str(auth_value).map_err(|_| ConfigError::InvalidFormat {
        var: provider.api_key_var(),
        reason: "API key is not a valid header value",
    })?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(auth_name, auth);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );

    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()?)
}

/// Turns a non-2xx response into a provider error, keeping the upstream message.
async fn status_error(
    provider: LlmProvider,
    model: &str,
    url: &str,
    resp: reqwest::Response,
    latency_ms: u128,
) -> AiLlmError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    let snippet = make_snippet(&text);
    let message = upstream_error_message(&text);

    error!(
        %provider,
        %status,
        %url,
        %snippet,
        %model,
        latency_ms,
        "generation request returned non-success status"
    );

    ProviderError::new(
        provider,
        ProviderErrorKind::HttpStatus(HttpError {
            status,
            url: url.to_string(),
            snippet,
            message,
        }),
    )
    .into()
}
