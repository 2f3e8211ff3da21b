// handlers/elevated/mod.rs - Administrative handlers under /api/admin
pub mod whitelist;

pub use whitelist::{whitelist_list, whitelist_show};
