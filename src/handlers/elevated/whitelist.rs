// handlers/elevated/whitelist.rs - GET /api/admin/whitelist[/:user_id] handlers

use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::WhitelistEntry;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn whitelist_list(State(state): State<AppState>) -> ApiResult<Vec<WhitelistEntry>> {
    Ok(ApiResponse::success(state.whitelist.entries()))
}

pub async fn whitelist_show(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Value> {
    let authority = state.gate.authority();
    if !authority.is_whitelisted(&user_id)? {
        return Err(ApiError::not_found(format!("User '{}' is not whitelisted", user_id)));
    }

    Ok(ApiResponse::success(json!({
        "user_id": user_id,
        "role": authority.role_of(&user_id)?,
    })))
}
