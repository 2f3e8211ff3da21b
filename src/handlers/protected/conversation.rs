// handlers/protected/conversation.rs - GET/DELETE /api/conversation/:id handlers

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn conversation_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let messages = state.chat.history(&id).await;
    Ok(ApiResponse::success(json!({
        "conversation_id": id,
        "messages": messages,
    })))
}

pub async fn conversation_delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let cleared = state.chat.clear(&id).await;
    tracing::info!("Conversation cleared: id={} existed={}", id, cleared);
    Ok(ApiResponse::success(json!({
        "conversation_id": id,
        "cleared": cleared,
    })))
}
