use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use concierge::ConciergeError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ai_llm_service::AiLlmError),

    // --- IO / network / server ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("{0}")]
    BadRequest(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    // --- Concierge pipeline ---
    #[error(transparent)]
    Concierge(#[from] ConciergeError),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Concierge(ConciergeError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,

            // 5xx
            AppError::Concierge(ConciergeError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Concierge(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) | AppError::Bind { .. } | AppError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// `(error, details)` pair for the response body. Client errors carry no details.
    fn body(&self) -> ErrorBody {
        match self {
            AppError::BadRequest(msg) => ErrorBody::client(msg.clone()),
            AppError::MethodNotAllowed => ErrorBody::client(self.to_string()),
            AppError::Concierge(ConciergeError::InvalidRequest(msg)) => {
                ErrorBody::client(msg.clone())
            }
            AppError::Concierge(e) => ErrorBody {
                error: e.summary().to_string(),
                details: Some(e.details()),
            },
            AppError::Config(e) => ErrorBody {
                error: "Configuration or Initialization Error".into(),
                details: Some(e.to_string()),
            },
            AppError::Bind { .. } | AppError::Server(_) => ErrorBody {
                error: "Internal Server Error".into(),
                details: Some(self.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ErrorBody {
    fn client(error: String) -> Self {
        Self {
            error,
            details: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.body();

        if status.is_server_error() {
            error!(status = status.as_u16(), error = %body.error, details = ?body.details, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %body.error, "request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Malformed JSON, wrong content type and shape mismatches are all 400 here.
impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}
