//! Google Gemini service for structured (JSON) generation.
//!
//! Minimal, non-streaming client around the Generative Language REST API:
//! - POST {endpoint}/v1beta/models/{model}:generateContent
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL, so
//! request URLs are safe to log and to embed in errors.
//!
//! When `web_search` is enabled the request carries the `googleSearch` tool.
//! Gemini rejects a response schema combined with tools, so in that mode the
//! JSON contract is conveyed by the prompt alone and callers must tolerate
//! fenced output.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ProviderError, ProviderErrorKind, Result},
    generation::{GenerationClient, StructuredRequest},
    services::{build_client, status_error, validate},
};

/// Thin client for the Gemini `generateContent` endpoint.
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    timeout: Duration,
}

impl std::fmt::Debug for GeminiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiService")
            .field("cfg", &self.cfg)
            .field("url_generate", &self.url_generate)
            .finish()
    }
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::InvalidProvider`] if `cfg.provider` is not Gemini
    /// - [`crate::ConfigError::MissingVar`] if `cfg.api_key` is absent
    /// - [`ProviderErrorKind::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let (api_key, base) = validate(&cfg, LlmProvider::Gemini)?;
        let timeout = Duration::from_secs(cfg.timeout_secs_or_default());

        let client = build_client(
            LlmProvider::Gemini,
            HeaderName::from_static("x-goog-api-key"),
            &api_key,
            timeout,
        )?;

        let url_generate = format!("{}/v1beta/models/{}:generateContent", base, cfg.model);

        info!(
            provider = %cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            web_search = cfg.web_search,
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
            timeout,
        })
    }
}

#[async_trait]
impl GenerationClient for GeminiService {
    fn provider(&self) -> LlmProvider {
        LlmProvider::Gemini
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Performs a single **non-streaming** `generateContent` call.
    ///
    /// # Errors
    /// - [`ProviderErrorKind::HttpStatus`] for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] / [`AiLlmError::Timeout`] for client/network failures
    /// - [`ProviderErrorKind::Decode`] if the envelope cannot be parsed
    /// - [`ProviderErrorKind::EmptyCandidates`] if no candidate carries text
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    async fn generate(&self, req: &StructuredRequest<'_>) -> Result<String> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, req);

        debug!(
            prompt_len = req.prompt.len(),
            has_system = req.system.is_some(),
            web_search = self.cfg.web_search,
            "POST {}", self.url_generate
        );

        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiLlmError::from_transport(e, self.timeout))?;

        if !resp.status().is_success() {
            return Err(status_error(
                LlmProvider::Gemini,
                &self.cfg.model,
                &self.url_generate,
                resp,
                started.elapsed().as_millis(),
            )
            .await);
        }

        let out: GenerateContentResponse = resp.json().await.map_err(|e| {
            if e.is_timeout() {
                return AiLlmError::Timeout(self.timeout);
            }
            warn!(
                error = %e,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode generateContent response"
            );
            ProviderError::new(
                LlmProvider::Gemini,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `candidates[0].content.parts[].text`"
                )),
            )
            .into()
        })?;

        let text = out.first_candidate_text().ok_or_else(|| {
            warn!(
                latency_ms = started.elapsed().as_millis(),
                "generateContent returned no candidate text"
            );
            ProviderError::new(LlmProvider::Gemini, ProviderErrorKind::EmptyCandidates)
        })?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            response_len = text.len(),
            "generateContent completed"
        );

        Ok(text)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, req: &StructuredRequest<'a>) -> Self {
        let (response_mime_type, response_schema, tools) = if cfg.web_search {
            (
                None,
                None,
                vec![Tool {
                    google_search: GoogleSearch {},
                }],
            )
        } else {
            (
                Some("application/json"),
                Some(req.schema.to_gemini()),
                Vec::new(),
            )
        };

        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: req.prompt }],
            }],
            system_instruction: req.system.map(|text| SystemInstruction {
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                response_mime_type,
                response_schema,
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                max_output_tokens: cfg.max_tokens,
            },
            tools,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate; `None` if blank.
    fn first_candidate_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        if let Some(reason) = candidate.finish_reason.as_deref() {
            debug!(finish_reason = reason, "first candidate finish reason");
        }
        let text: String = candidate
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error_handler::ConfigError;
    use crate::generation::{ResponseSchema, SchemaField};

    const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

    fn cfg(endpoint: &str) -> LlmModelConfig {
        let mut cfg = LlmModelConfig::for_provider(LlmProvider::Gemini);
        cfg.model = "test-model".into();
        cfg.endpoint = endpoint.into();
        cfg.api_key = Some("test-key".into());
        cfg.timeout_secs = Some(5);
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

    fn candidates(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn sends_schema_system_instruction_and_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "question" }] }],
                "systemInstruction": { "parts": [{ "text": "be nice" }] },
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "type": "OBJECT", "required": ["answer"] }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidates(r#"{"answer":"42"}"#)))
            .expect(1)
            .mount(&server)
            .await;

        let svc = GeminiService::new(cfg(&server.uri())).unwrap();
        let schema = schema();
        let out = svc
            .generate(&StructuredRequest {
                system: Some("be nice"),
                prompt: "question",
                schema: &schema,
            })
            .await
            .unwrap();

        assert_eq!(out, r#"{"answer":"42"}"#);
    }

    #[tokio::test]
    async fn forbidden_keeps_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "API key not valid.", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let svc = GeminiService::new(cfg(&server.uri())).unwrap();
        let schema = schema();
        let err = svc
            .generate(&StructuredRequest {
                system: None,
                prompt: "q",
                schema: &schema,
            })
            .await
            .unwrap_err();

        assert_eq!(err.upstream_message(), Some("API key not valid."));
        match err {
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::HttpStatus(http),
                ..
            }) => {
                assert_eq!(http.status.as_u16(), 403);
                assert!(!http.url.contains("test-key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_candidates_is_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            })))
            .mount(&server)
            .await;

        let svc = GeminiService::new(cfg(&server.uri())).unwrap();
        let schema = schema();
        let err = svc
            .generate(&StructuredRequest {
                system: None,
                prompt: "q",
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

    #[tokio::test]
    async fn web_search_sends_tool_without_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(candidates("{}")))
            .mount(&server)
            .await;

        let mut cfg = cfg(&server.uri());
        cfg.web_search = true;
        let svc = GeminiService::new(cfg).unwrap();
        let schema = schema();
        svc.generate(&StructuredRequest {
            system: None,
            prompt: "q",
            schema: &schema,
        })
        .await
        .unwrap();

        let received = server.received_requests().await.unwrap();
        let body: Value = received[0].body_json().unwrap();
        assert_eq!(body["tools"], json!([{ "googleSearch": {} }]));
        assert!(body["generationConfig"].get("responseSchema").is_none());
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(candidates("{}"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut cfg = cfg(&server.uri());
        cfg.timeout_secs = Some(1);
        let svc = GeminiService::new(cfg).unwrap();
        let schema = schema();
        let err = svc
            .generate(&StructuredRequest {
                system: None,
                prompt: "q",
                schema: &schema,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AiLlmError::Timeout(d) if d == Duration::from_secs(1)));
    }

    #[test]
    fn missing_key_is_config_error() {
        let mut cfg = cfg("http://localhost:1");
        cfg.api_key = None;
        assert!(matches!(
            GeminiService::new(cfg),
            Err(AiLlmError::Config(ConfigError::MissingVar("GEMINI_API_KEY")))
        ));
    }
}
