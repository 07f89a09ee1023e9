//! OpenAI (ChatGPT) service for structured (JSON) generation.
//!
//! Minimal, non-streaming client around the OpenAI REST API (or any server
//! speaking the same protocol):
//! - POST {endpoint}/v1/chat/completions with `response_format.type = "json_schema"`
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::OpenAI`
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ProviderError, ProviderErrorKind, Result},
    generation::{GenerationClient, StructuredRequest},
    services::{build_client, status_error, validate},
};

/// Thin client for the OpenAI chat completions API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (with timeout and default headers).
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiService")
            .field("cfg", &self.cfg)
            .field("url_chat", &self.url_chat)
            .finish()
    }
}

impl OpenAiService {
    /// Creates a new [`OpenAiService`] from the given config.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::InvalidProvider`] if `cfg.provider` is not OpenAI
    /// - [`crate::ConfigError::MissingVar`] if `cfg.api_key` is `None`
    /// - [`ProviderErrorKind::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let (api_key, base) = validate(&cfg, LlmProvider::OpenAI)?;
        let timeout = Duration::from_secs(cfg.timeout_secs_or_default());

        let client = build_client(
            LlmProvider::OpenAI,
            header::AUTHORIZATION,
            &format!("Bearer {api_key}"),
            timeout,
        )?;

        let url_chat = format!("{}/v1/chat/completions", base);

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "OpenAiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_chat,
            timeout,
        })
    }
}

#[async_trait]
impl GenerationClient for OpenAiService {
    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAI
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Performs a **non-streaming** chat completion request with a strict JSON schema.
    ///
    /// `messages`: optional system message, then the user prompt.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] / [`AiLlmError::Timeout`] for client/network failures
    /// - [`ProviderErrorKind::Decode`] if the JSON cannot be parsed
    /// - [`ProviderErrorKind::EmptyCandidates`] if no choice carries content
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    async fn generate(&self, req: &StructuredRequest<'_>) -> Result<String> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, req);

        debug!(
            prompt_len = req.prompt.len(),
            has_system = req.system.is_some(),
            "POST {}", self.url_chat
        );

        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(status_error(
                LlmProvider::OpenAI,
                &self.cfg.model,
                &self.url_chat,
                resp,
                started.elapsed().as_millis(),
            )
            .await);
        }

        let out: ChatCompletionResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                return AiLlmError::Timeout(self.timeout);
            }
            warn!(
                error = %e,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode /v1/chat/completions response"
            );
            ProviderError::new(
                LlmProvider::OpenAI,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `choices[0].message.content`"
                )),
            )
            .into()
        })?;

        let content = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::new(LlmProvider::OpenAI, ProviderErrorKind::EmptyCandidates)
            })?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            response_len = content.len(),
            "chat completion completed"
        );

        Ok(content)
    }
}

/* ===========================================================================
HTTP payloads & options
======================================================================== */

/// Request body for `/v1/chat/completions` (non-streaming, structured output).
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, req: &StructuredRequest<'a>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = req.system {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: req.prompt,
        });

        Self {
            model: &cfg.model,
            messages,
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: req.schema.name,
                    strict: true,
                    schema: req.schema.to_json_schema(),
                },
            },
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    /// "system" | "user"
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: &'static str,
    strict: bool,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageOut,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::generation::{ResponseSchema, SchemaField};

    fn cfg(endpoint: &str) -> LlmModelConfig {
        let mut cfg = LlmModelConfig::for_provider(LlmProvider::OpenAI);
        cfg.model = "test-model".into();
        cfg.endpoint = endpoint.into();
        cfg.api_key = Some("test-key".into());
        cfg
    }

    fn schema() -> ResponseSchema {
        ResponseSchema {
            name: "reply",
            fields: vec![SchemaField {
                name: "answer",
                description: "the answer",
                required: true,
            }],
        }
    }

    #[tokio::test]
    async fn sends_json_schema_and_system_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "messages": [
                    { "role": "system", "content": "rules" },
                    { "role": "user", "content": "hello" }
                ],
                "response_format": {
                    "type": "json_schema",
                    "json_schema": { "name": "reply", "strict": true }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "{\"answer\":\"hi\"}" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let svc = OpenAiService::new(cfg(&server.uri())).unwrap();
        let schema = schema();
        let out = svc
            .generate(&StructuredRequest {
                system: Some("rules"),
                prompt: "hello",
                schema: &schema,
            })
            .await
            .unwrap();

        assert_eq!(out, r#"{"answer":"hi"}"#);
    }

    #[tokio::test]
    async fn server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let svc = OpenAiService::new(cfg(&server.uri())).unwrap();
        let schema = schema();
        let err = svc
            .generate(&StructuredRequest {
                system: None,
                prompt: "hello",
                schema: &schema,
            })
            .await
            .unwrap_err();

        match err {
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::HttpStatus(http),
                ..
            }) => {
                assert_eq!(http.status.as_u16(), 503);
                assert_eq!(http.snippet, "overloaded");
                assert!(http.message.is_none());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn null_content_is_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": null, "refusal": "no" } }]
            })))
            .mount(&server)
            .await;

        let svc = OpenAiService::new(cfg(&server.uri())).unwrap();
        let schema = schema();
        let err = svc
            .generate(&StructuredRequest {
                system: None,
                prompt: "hello",
                schema: &schema,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::EmptyCandidates,
                ..
            })
        ));
    }

    #[test]
    fn rejects_gemini_config() {
        let mut cfg = cfg("http://localhost:1");
        cfg.provider = LlmProvider::Gemini;
        assert!(matches!(
            OpenAiService::new(cfg),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::InvalidProvider,
                ..
            }))
        ));
    }
}
