// handlers/protected/chat.rs - POST /api/chat handler

use axum::extract::State;

use crate::app::AppState;
use crate::chat::{ChatRequest, ChatResponse};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn chat_post(State(state): State<AppState>, body: String) -> ApiResult<ChatResponse> {
    let request: ChatRequest =
        serde_json::from_str(&body).map_err(|e| ApiError::invalid_json(format!("Invalid chat request: {}", e)))?;

    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }

    Ok(ApiResponse::success(state.chat.process(request).await))
}
