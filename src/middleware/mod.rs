pub mod auth;
pub mod response;

pub use auth::auth_gate_middleware;
pub use response::{ApiResponse, ApiResult};
