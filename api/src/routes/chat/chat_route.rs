//! POST /api/chat: answers a question from the brand knowledge document.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use concierge::ConciergeResponse;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::chat::chat_request::ChatRequest,
};

/// Handler: POST /api/chat (also mounted at /api/proxy)
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:3000/api/chat \
///   -H 'content-type: application/json' \
///   -d '{"query":"What is our primary brand color?"}'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ConciergeResponse>> {
    let Json(body) = payload?;
    let query = body
        .query
        .ok_or_else(|| AppError::BadRequest("Missing 'query' in request body.".into()))?;

    let answer = state
        .concierge
        .handle(&query, body.knowledge_base_content.as_deref())
        .await?;

    Ok(Json(answer))
}

/// Fallback for any non-POST method on the chat routes.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
