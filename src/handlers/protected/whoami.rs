// handlers/protected/whoami.rs - GET /api/auth/whoami handler

use axum::extract::{Extension, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::IdentityClaim;
use crate::middleware::{ApiResponse, ApiResult};

/// Current identity, if any, with its whitelist role.
pub async fn whoami_get(
    State(state): State<AppState>,
    claim: Option<Extension<IdentityClaim>>,
) -> ApiResult<Value> {
    let Some(Extension(claim)) = claim else {
        return Ok(ApiResponse::success(json!({ "authenticated": false })));
    };

    let role = match claim.user_id.as_deref() {
        Some(user_id) => state.gate.authority().role_of(user_id)?,
        None => None,
    };

    Ok(ApiResponse::success(json!({
        "authenticated": true,
        "claim": claim,
        "role": role,
    })))
}
