//! GET /health: liveness plus the active configuration. Never calls upstream.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
    pub knowledge_base: &'static str,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let config = state.concierge.config();
    Json(HealthResponse {
        status: "ok",
        provider: config.llm.provider.to_string(),
        model: config.llm.model.clone(),
        knowledge_base: state.concierge.knowledge_source().label(),
    })
}
