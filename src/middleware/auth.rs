use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::auth::GateOutcome;

/// Route-policy gate.
///
/// Resolves the policy for the matched route template, reads the
/// configured credential header and either forwards the request (with the
/// decoded identity in extensions) or short-circuits with the deny body.
/// Must be installed with `route_layer` so the matched path is known.
pub async fn auth_gate_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let policy = state.policies.resolve(&method, &path);
    // A present header always reaches the decoder, even with non-ASCII bytes.
    let credential = request
        .headers()
        .get(state.token_header.as_str())
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    match state.gate.evaluate(policy, credential.as_deref()) {
        GateOutcome::Allow(claim) => {
            if let Some(claim) = claim {
                tracing::debug!("Gate passed: {} {} user={:?}", method, path, claim.user_id);
                request.extensions_mut().insert(claim);
            }
            next.run(request).await
        }
        GateOutcome::Deny(denial) => {
            tracing::warn!(
                "Request denied: {} {} reason={:?} status={}",
                method,
                path,
                denial,
                denial.status_code()
            );
            state.gate.deny_error(denial).into_response()
        }
    }
}
