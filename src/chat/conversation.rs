use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::config::ConversationConfig;
use crate::semantic::SemanticQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_sql: Option<SemanticQuery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            semantic_sql: None,
            sql_query: None,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, semantic_sql: SemanticQuery, sql_query: String) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            semantic_sql: Some(semantic_sql),
            sql_query: Some(sql_query),
            timestamp: Utc::now(),
        }
    }
}

struct Conversation {
    messages: VecDeque<ConversationMessage>,
    last_touched: Instant,
}

/// Per-conversation chat history with bounded size.
///
/// Conversations idle longer than `ttl` are dropped on the next access.
/// Past `max_entries` the least recently touched conversation is evicted,
/// and each conversation keeps only its latest `max_messages` messages.
pub struct ConversationStore {
    entries: HashMap<String, Conversation>,
    max_entries: usize,
    ttl: Duration,
    max_messages: usize,
}

impl ConversationStore {
    pub fn new(max_entries: usize, ttl: Duration, max_messages: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_entries: max_entries.max(1),
            ttl,
            max_messages: max_messages.max(1),
        }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(config.max_entries, Duration::from_secs(config.ttl_secs), config.max_messages)
    }

    pub fn append(&mut self, id: &str, message: ConversationMessage) {
        self.append_at(id, message, Instant::now());
    }

    pub fn history(&mut self, id: &str) -> Vec<ConversationMessage> {
        self.history_at(id, Instant::now())
    }

    /// Content of the most recent user message, if any.
    pub fn last_user_input(&mut self, id: &str) -> Option<String> {
        self.evict_expired(Instant::now());
        self.entries.get(id).and_then(|c| {
            c.messages
                .iter()
                .rev()
                .find(|m| m.role == Role::User)
                .map(|m| m.content.clone())
        })
    }

    /// Returns whether the conversation existed.
    pub fn clear(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn append_at(&mut self, id: &str, message: ConversationMessage, now: Instant) {
        self.evict_expired(now);

        let conversation = self.entries.entry(id.to_string()).or_insert_with(|| Conversation {
            messages: VecDeque::new(),
            last_touched: now,
        });
        conversation.messages.push_back(message);
        while conversation.messages.len() > self.max_messages {
            conversation.messages.pop_front();
        }
        conversation.last_touched = now;

        while self.entries.len() > self.max_entries {
            let oldest = self
                .entries
                .iter()
                .filter(|(key, _)| key.as_str() != id)
                .min_by(|(ka, a), (kb, b)| a.last_touched.cmp(&b.last_touched).then_with(|| ka.cmp(kb)))
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    tracing::debug!("Evicting conversation {} (capacity {})", key, self.max_entries);
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    fn history_at(&mut self, id: &str, now: Instant) -> Vec<ConversationMessage> {
        self.evict_expired(now);
        match self.entries.get_mut(id) {
            Some(conversation) => {
                conversation.last_touched = now;
                conversation.messages.iter().cloned().collect()
            }
            None => Vec::new(),
        }
    }

    fn evict_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, c| now.saturating_duration_since(c.last_touched) <= ttl);
    }
}
