use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::conversation::{ConversationMessage, ConversationStore};
use super::llm::{build_prompt, with_short_context, LanguageModel};
use crate::semantic::{clamp_limit, extract_semantic_query, validate, SemanticQuery, SqlCompiler};

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default, alias = "conversationId")]
    pub conversation_id: Option<String>,
    #[serde(default, alias = "databaseConnectionId")]
    pub database_connection_id: Option<String>,
    /// Schema summary of the target database, produced by the caller.
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub sql_query: String,
    pub semantic_sql: SemanticQuery,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
    pub debug: Value,
}

/// Turns one chat message into a semantic query and its SQL.
pub struct ChatService {
    model: Arc<dyn LanguageModel>,
    conversations: RwLock<ConversationStore>,
    max_limit: Option<u64>,
}

impl ChatService {
    pub fn new(model: Arc<dyn LanguageModel>, conversations: ConversationStore, max_limit: Option<u64>) -> Self {
        Self {
            model,
            conversations: RwLock::new(conversations),
            max_limit,
        }
    }

    pub async fn process(&self, request: ChatRequest) -> ChatResponse {
        let conversation_id = request
            .conversation_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        tracing::info!(
            "Incoming chat: conversation_id={}, database={:?}",
            conversation_id,
            request.database_connection_id
        );

        let previous = {
            let mut store = self.conversations.write().await;
            let previous = store.last_user_input(&conversation_id);
            store.append(&conversation_id, ConversationMessage::user(request.message.clone()));
            previous
        };

        let prompt = build_prompt(
            request.schema.as_deref().unwrap_or_default(),
            &with_short_context(previous.as_deref(), &request.message),
        );

        let mut debug = self.model.describe();
        let converted = match self.model.generate(&prompt).await {
            Ok(raw) => {
                debug["raw_response"] = json!(raw);
                extract_semantic_query(&raw).map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };
        debug["prompt"] = json!(prompt);

        let (mut semantic, failure) = match converted {
            Ok(semantic) => (semantic, None),
            Err(reason) => {
                tracing::error!("Semantic conversion failed: cid={} error={}", conversation_id, reason);
                debug["error"] = json!(reason);
                (SemanticQuery::default(), Some(reason))
            }
        };

        clamp_limit(&mut semantic, self.max_limit);
        let validation_error = validate(&semantic).err().map(|e| e.to_string());
        let sql = SqlCompiler::compile(&semantic);
        tracing::info!("Generated SQL: cid={} sql={}", conversation_id, sql);

        let response = match failure {
            Some(reason) => format!("Failed to convert your question into a query: {}", reason),
            None => compose_reply(&semantic, &sql),
        };

        self.conversations.write().await.append(
            &conversation_id,
            ConversationMessage::assistant(response.clone(), semantic.clone(), sql.clone()),
        );

        ChatResponse {
            response,
            sql_query: sql,
            semantic_sql: semantic,
            conversation_id,
            validation_error,
            debug,
        }
    }

    pub async fn history(&self, conversation_id: &str) -> Vec<ConversationMessage> {
        self.conversations.write().await.history(conversation_id)
    }

    pub async fn clear(&self, conversation_id: &str) -> bool {
        self.conversations.write().await.clear(conversation_id)
    }
}

fn compose_reply(semantic: &SemanticQuery, sql: &str) -> String {
    let mut reply = String::from("I converted your question into SQL:\n\n**Semantic query:**\n");
    let tables = if semantic.tables.is_empty() {
        "(none)".to_string()
    } else {
        semantic.tables.join(", ")
    };
    let columns = if semantic.columns.is_empty() {
        "all columns".to_string()
    } else {
        semantic.columns.join(", ")
    };
    let _ = writeln!(reply, "- Tables: {}", tables);
    let _ = writeln!(reply, "- Columns: {}", columns);
    if !semantic.conditions.is_empty() {
        let _ = writeln!(reply, "- Conditions: {}", semantic.conditions.len());
    }
    if !semantic.aggregations.is_empty() {
        let _ = writeln!(reply, "- Aggregations: {}", semantic.aggregations.len());
    }
    if !semantic.joins.is_empty() {
        let _ = writeln!(reply, "- Joins: {}", semantic.joins.len());
    }
    let _ = write!(reply, "\n**Generated SQL:**\n```sql\n{}\n```\n\nShall I run this query?", sql);
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::llm::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses and records the prompts it saw.
    struct ScriptedModel {
        replies: Mutex<Vec<Result<String, ()>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, ()>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.replies.lock().unwrap().remove(0) {
                Ok(text) => Ok(text),
                Err(()) => Err(LlmError::EmptyResponse),
            }
        }
    }

    fn service(model: Arc<ScriptedModel>) -> ChatService {
        ChatService::new(model, ConversationStore::new(10, Duration::from_secs(60), 10), Some(100))
    }

    fn request(message: &str, conversation_id: Option<&str>) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            conversation_id: conversation_id.map(str::to_string),
            database_connection_id: None,
            schema: Some("users(id, name, age)".to_string()),
        }
    }

    #[tokio::test]
    async fn converts_and_compiles() {
        let model = ScriptedModel::new(vec![Ok(
            "```json\n{\"tables\":[\"users\"],\"columns\":[\"name\"],\"conditions\":[{\"column\":\"age\",\"operator\":\">\",\"value\":30}],\"limit\":500}\n```"
                .to_string(),
        )]);
        let service = service(model.clone());

        let res = service.process(request("users older than 30", None)).await;
        assert_eq!(res.sql_query, "SELECT name FROM users WHERE age > 30 LIMIT 100");
        assert!(res.validation_error.is_none());
        assert!(res.response.contains("- Tables: users"));
        assert!(!res.conversation_id.is_empty());
        assert!(model.prompts.lock().unwrap()[0].contains("users(id, name, age)"));

        let history = service.history(&res.conversation_id).await;
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn second_turn_carries_previous_input() {
        let reply = Ok("{\"tables\":[\"users\"]}".to_string());
        let model = ScriptedModel::new(vec![reply.clone(), reply]);
        let service = service(model.clone());

        service.process(request("count users", Some("c1"))).await;
        service.process(request("only adults", Some("c1"))).await;

        let prompts = model.prompts.lock().unwrap();
        assert!(!prompts[0].contains("Previous user input"));
        assert!(prompts[1].contains("Previous user input (for reference): count users"));
    }

    #[tokio::test]
    async fn model_failure_degrades_to_placeholder() {
        let service = service(ScriptedModel::new(vec![Err(())]));

        let res = service.process(request("anything", Some("c2"))).await;
        assert_eq!(res.sql_query, "SELECT 1; -- No tables specified");
        assert_eq!(res.conversation_id, "c2");
        assert!(res.response.starts_with("Failed to convert"));
        assert!(res.debug["error"].is_string());
    }

    #[tokio::test]
    async fn unparseable_reply_degrades_to_placeholder() {
        let service = service(ScriptedModel::new(vec![Ok("Sorry, I cannot help.".to_string())]));

        let res = service.process(request("anything", None)).await;
        assert!(res.sql_query.starts_with("SELECT 1;"));
        assert_eq!(res.validation_error.as_deref(), Some("No tables specified"));
    }

    #[tokio::test]
    async fn clear_drops_history() {
        let service = service(ScriptedModel::new(vec![Ok("{\"tables\":[\"t\"]}".to_string())]));
        service.process(request("q", Some("c3"))).await;

        assert!(service.clear("c3").await);
        assert!(service.history("c3").await.is_empty());
    }
}
