pub mod conversation;
pub mod llm;
pub mod service;

pub use conversation::{ConversationMessage, ConversationStore, Role};
pub use llm::{LanguageModel, LlmError, OllamaModel};
pub use service::{ChatRequest, ChatResponse, ChatService};
