// handlers/public/mod.rs - Public handlers (no route policy)

use axum::response::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "ChatBI API",
            "version": version,
            "description": "Natural-language to SQL chat backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "compile": "POST /api/compile (credential required)",
                "chat": "POST /api/chat (credential required)",
                "conversation": "GET|DELETE /api/conversation/:id (public)",
                "whoami": "GET /api/auth/whoami (credential optional)",
                "admin": "/api/admin/* (ADMIN role)",
            }
        }
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
