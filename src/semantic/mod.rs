pub mod compiler;
pub mod error;
pub mod extract;
pub mod types;
pub mod validate;

pub use compiler::SqlCompiler;
pub use error::SemanticError;
pub use extract::extract_semantic_query;
pub use types::*;
pub use validate::{clamp_limit, validate};
