//! v1 REST API.
//!
//! | Method | Path        | Purpose                                   |
//! |--------|-------------|-------------------------------------------|
//! | GET    | `/v1/tools` | The tool catalog offered to the model     |
//! | POST   | `/v1/chat`  | Run one assistant turn                    |

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use hubpilot_agent::{TurnError, TurnRequest, TurnResult};
use hubpilot_core::{Attachment, Message, ToolDefinition};

use crate::SharedState;

/// Build the v1 router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/tools", get(tools_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
            retry_after_secs: None,
        }),
    )
}

/// Map a failed turn onto an HTTP status and error code.
pub fn turn_error_response(err: &TurnError) -> ApiError {
    match err {
        TurnError::RateLimited { retry_after_secs } => {
            let (status, mut body) =
                api_error(StatusCode::TOO_MANY_REQUESTS, "rate_limited", err.to_string());
            body.retry_after_secs = Some(*retry_after_secs);
            (status, body)
        }
        TurnError::Authentication(_) => api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "configuration_error",
            "The assistant is not configured correctly. Check the model API key.",
        ),
        TurnError::Model(_) => api_error(StatusCode::BAD_GATEWAY, "model_error", err.to_string()),
        TurnError::Store(_) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "The conversation could not be loaded or saved.",
        ),
    }
}

// ── Tools ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsResponse {
    pub tools: Vec<ToolDefinition>,
    pub search_configured: bool,
}

async fn tools_handler(State(state): State<SharedState>) -> Json<ToolsResponse> {
    let dispatcher = state.agent.dispatcher();
    Json(ToolsResponse {
        tools: dispatcher.definitions(),
        search_configured: dispatcher.search_configured(),
    })
}

// ── Chat ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub tenant_id: String,
    /// Omit to start a new conversation
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<Message>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub conversation_id: String,
    #[serde(flatten)]
    pub result: TurnResult,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.tenant_id.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "tenantId is required",
        ));
    }
    if payload.message.trim().is_empty() && payload.attachments.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "A message or at least one attachment is required",
        ));
    }

    let conversation_id = payload
        .conversation_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!(
        tenant = %payload.tenant_id,
        conversation = %conversation_id,
        attachments = payload.attachments.len(),
        "v1/chat request"
    );

    let request = TurnRequest {
        tenant_id: payload.tenant_id,
        conversation_id: conversation_id.clone(),
        user_id: payload.user_id.unwrap_or_else(|| "anonymous".into()),
        message: payload.message,
        history: payload.history,
        attachments: payload.attachments,
    };

    match state.agent.run_turn(request).await {
        Ok(result) => Ok(Json(ChatResponse {
            conversation_id,
            result,
        })),
        Err(e) => {
            warn!(conversation = %conversation_id, error = %e, "Turn failed");
            Err(turn_error_response(&e))
        }
    }
}
