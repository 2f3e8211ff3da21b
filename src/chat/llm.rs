use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model returned an empty response")]
    EmptyResponse,
}

/// Text-in, text-out model used to turn a question into semantic query JSON.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Provider details echoed in chat debug output.
    fn describe(&self) -> Value {
        json!({})
    }
}

/// Ollama `/api/generate` client.
pub struct OllamaModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaModel {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        tracing::info!("Invoking Ollama: base={} model={}", self.base_url, self.model);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let res = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload = res.json::<GenerateResponse>().await?;
        if payload.response.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(payload.response)
    }

    fn describe(&self) -> Value {
        json!({
            "provider": "ollama",
            "base_url": self.base_url,
            "model": self.model,
        })
    }
}

const SYSTEM_PROMPT: &str = r#"You are a SQL semantics converter. Turn the user's natural-language question into a structured semantic query in JSON.

The output must be strict JSON with these fields:
{
    "tables": ["table1", "table2"],
    "columns": ["column1", "column2", "AGG(column)"],
    "conditions": [
        {"column": "column", "operator": "operator", "value": "value", "table": "table"}
    ],
    "aggregations": [
        {"function": "function", "column": "column", "alias": "alias"}
    ],
    "joins": [
        {"type": "join type", "table1": "table1", "table2": "table2", "condition": "join condition"}
    ],
    "order_by": [{"column": "column", "direction": "ASC/DESC"}],
    "group_by": ["column"],
    "limit": number
}

Supported operators: =, !=, >, <, >=, <=, LIKE, IN, BETWEEN
Supported aggregate functions: COUNT, SUM, AVG, MAX, MIN
Supported join types: INNER, LEFT, RIGHT, FULL

Example:
Question: "Total order amount per user, grouped by user id"
Output:
{
    "tables": ["users", "orders"],
    "columns": ["users.id", "SUM(orders.amount) AS total_amount"],
    "conditions": [],
    "aggregations": [{"function": "SUM", "column": "orders.amount", "alias": "total_amount"}],
    "joins": [{"type": "INNER", "table1": "users", "table2": "orders", "condition": "users.id = orders.user_id"}],
    "order_by": [],
    "group_by": ["users.id"],
    "limit": null
}

Output the JSON only, with no other text.

The database tables and columns follow. Use them to pick the right tables and fields; do not copy the metadata itself into the output."#;

/// Assemble the full prompt sent to the model.
pub fn build_prompt(schema_summary: &str, user_input: &str) -> String {
    format!(
        "{}\n\nDatabase metadata:\n{}\n\nUser question: {}",
        SYSTEM_PROMPT,
        schema_summary.trim(),
        user_input
    )
}

/// Prefix the current question with the previous one from the same conversation.
pub fn with_short_context(previous: Option<&str>, current: &str) -> String {
    match previous {
        Some(prev) => format!(
            "Previous user input (for reference): {}\nCurrent user input: {}",
            prev, current
        ),
        None => current.to_string(),
    }
}
