// handlers/public/chatbot.rs - chat sessions backed by the language model
use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{ChatRequest, ChatSession};
use crate::state::AppState;

/// POST /chatbot/new - start a session with the first user message
pub async fn new_session(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatSession> {
    let Json(request) = payload?;
    Ok(ApiResponse::created(state.chat.start(request.message).await?))
}

/// POST /chatbot/:session_id - append a message and get the reply
pub async fn continue_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatSession> {
    let Json(request) = payload?;
    Ok(ApiResponse::success(state.chat.send(&session_id, request.message).await?))
}
