use thiserror::Error;

#[derive(Error, Debug)]
pub enum SemanticError {
    #[error("No tables specified")]
    NoTables,

    #[error("No JSON object found in model response")]
    NoJsonObject,

    #[error("Invalid condition on '{column}': {reason}")]
    InvalidCondition { column: String, reason: String },

    #[error("Invalid aggregation: {0}")]
    InvalidAggregation(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
