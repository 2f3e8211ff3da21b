// handlers/protected/compile.rs - POST /api/compile handler

use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::semantic::{validate, SemanticError, SemanticQuery, SqlCompiler};

#[derive(Debug, Serialize)]
pub struct CompileResponse {
    pub sql: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

/// Compile a Semantic Query JSON body to SQL.
///
/// The body is parsed here rather than through the `Json` extractor so that
/// malformed input gets the standard `{"error", "code"}` body.
pub async fn compile_post(body: String) -> ApiResult<CompileResponse> {
    let query: SemanticQuery = serde_json::from_str(&body).map_err(SemanticError::from)?;

    let validation_error = validate(&query).err().map(|e| e.to_string());
    let sql = SqlCompiler::compile(&query);

    Ok(ApiResponse::success(CompileResponse {
        sql,
        valid: validation_error.is_none(),
        validation_error,
    }))
}
