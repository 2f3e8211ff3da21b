// handlers/mod.rs - Handlers grouped by access tier
//
// Public (no policy) → Protected (route policy, credential header) →
// Elevated (admin scope, role-restricted)
pub mod elevated;
pub mod protected;
pub mod public;
