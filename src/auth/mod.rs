pub mod claims;
pub mod gate;
pub mod policy;
pub mod whitelist;

pub use claims::{decode_credential, IdentityClaim};
pub use gate::{AuthGate, Denial, DenyMessages, GateOutcome};
pub use policy::{PolicyTable, RoutePolicy};
pub use whitelist::{StaticWhitelist, WhitelistAuthority, WhitelistEntry, WhitelistError};
