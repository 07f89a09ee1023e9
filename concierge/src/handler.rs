use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use ai_llm_service::{GenerationClient, ResponseSchema, StructuredRequest, connect};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ConciergeConfig,
    errors::ConciergeError,
    knowledge::{KnowledgeBase, KnowledgeDocument, KnowledgeSource},
    prompt::{Persona, build_prompt, response_schema},
    response::{ConciergeResponse, parse_reply},
};

/// The concierge request handler.
///
/// Construct once, wrap in `Arc`, share between requests. Mutable state is
/// limited to two write-once cells: the default knowledge document and the
/// generation client, both initialized on first use.
pub struct Concierge {
    config: ConciergeConfig,
    knowledge: KnowledgeBase,
    client: OnceCell<Arc<dyn GenerationClient>>,
    schema: ResponseSchema,
}

impl Concierge {
    /// Handler that builds its provider client from `config.llm` on first use.
    pub fn new(config: ConciergeConfig) -> Self {
        Self::with_client_cell(config, OnceCell::new())
    }

    /// Handler with an injected client (another provider, or a fake in tests).
    pub fn with_client(config: ConciergeConfig, client: Arc<dyn GenerationClient>) -> Self {
        Self::with_client_cell(config, OnceCell::new_with(Some(client)))
    }

    fn with_client_cell(
        config: ConciergeConfig,
        client: OnceCell<Arc<dyn GenerationClient>>,
    ) -> Self {
        Self {
            knowledge: KnowledgeBase::new(config.knowledge.clone()),
            config,
            client,
            schema: response_schema(),
        }
    }

    pub fn config(&self) -> &ConciergeConfig {
        &self.config
    }

    pub fn knowledge_source(&self) -> &KnowledgeSource {
        self.knowledge.source()
    }

    /// Loads the default document early so misconfiguration shows up in the
    /// startup logs instead of on the first request. Never fails.
    pub async fn warm_up(&self) {
        if matches!(self.knowledge.source(), KnowledgeSource::Disabled) {
            info!("no default knowledge document; requests must send knowledgeBaseContent");
            return;
        }
        if let Err(e) = self.knowledge.default_document().await {
            warn!(error = %e, "default knowledge document unavailable");
        }
    }

    /// Answers `question` from `knowledge_document`, or from the default
    /// document when none (or only whitespace) is given.
    ///
    /// Performs at most one upstream call and never retries.
    ///
    /// # Errors
    /// - [`ConciergeError::InvalidRequest`] for a blank question (no upstream call)
    /// - [`ConciergeError::ConfigurationMissing`] for a missing key or default document (no upstream call)
    /// - [`ConciergeError::UpstreamTransportFailure`] for network errors and non-2xx statuses
    /// - [`ConciergeError::UpstreamMalformed`] when the payload breaks the JSON contract
    /// - [`ConciergeError::Timeout`] when the call exceeds `LLM_TIMEOUT_SECS`
    #[instrument(name = "concierge_handle", skip_all, fields(question_len = question.len()))]
    pub async fn handle(
        &self,
        question: &str,
        knowledge_document: Option<&str>,
    ) -> Result<ConciergeResponse, ConciergeError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ConciergeError::InvalidRequest(
                "\"query\" must be a non-empty string".into(),
            ));
        }

        let knowledge = self.resolve_knowledge(knowledge_document).await?;
        let client = self.client().await?;

        let persona = Persona {
            fallback_phrase: &self.config.fallback_phrase,
            web_search: self.config.llm.web_search,
        };
        let envelope = build_prompt(&persona, &knowledge, question);
        let request = StructuredRequest {
            system: Some(&envelope.system),
            prompt: &envelope.user,
            schema: &self.schema,
        };

        debug!(
            provider = %client.provider(),
            model = client.model(),
            knowledge_len = knowledge.as_str().len(),
            prompt_len = envelope.user.len(),
            "calling generation service"
        );

        let limit = Duration::from_secs(self.config.llm.timeout_secs_or_default());
        let started = Instant::now();
        let raw = match tokio::time::timeout(limit, client.generate(&request)).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "generation call timed out");
                return Err(ConciergeError::Timeout(limit));
            }
        };

        let response = parse_reply(&raw, &self.config.fallback_phrase).inspect_err(|e| {
            warn!(error = %e, raw_len = raw.len(), "generation payload rejected");
        })?;

        info!(
            status = ?response.status,
            link = %response.recommended_link,
            latency_ms = started.elapsed().as_millis(),
            "concierge answered"
        );

        Ok(response)
    }

    async fn resolve_knowledge(
        &self,
        inline: Option<&str>,
    ) -> Result<KnowledgeDocument, ConciergeError> {
        match inline.map(KnowledgeDocument::new) {
            Some(doc) if !doc.is_blank() => Ok(doc),
            _ => self.knowledge.default_document().await,
        }
    }

    async fn client(&self) -> Result<Arc<dyn GenerationClient>, ConciergeError> {
        self.client
            .get_or_try_init(|| async { connect(&self.config.llm) })
            .await
            .cloned()
            .map_err(ConciergeError::from)
    }
}
