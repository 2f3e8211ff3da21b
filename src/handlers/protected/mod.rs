// handlers/protected/mod.rs - Handlers behind the route-policy gate
//
// The gate has already run when these execute; a decoded identity, when one
// was presented, is available as an `Extension<IdentityClaim>`.
pub mod chat;
pub mod compile;
pub mod conversation;
pub mod whoami;

pub use chat::chat_post;
pub use compile::compile_post;
pub use conversation::{conversation_delete, conversation_get};
pub use whoami::whoami_get;
