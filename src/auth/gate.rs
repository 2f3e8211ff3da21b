use std::sync::Arc;

use super::claims::{decode_credential, IdentityClaim};
use super::policy::RoutePolicy;
use super::whitelist::WhitelistAuthority;
use crate::config::AuthConfig;
use crate::error::ApiError;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Policy requires a credential and none was sent (401).
    NoToken,
    /// A credential was sent but carries no usable `userId` (403).
    InvalidIdentity,
    /// The identity is not an active whitelist member, or the lookup failed (403).
    NotWhitelisted,
    /// None of the policy's roles are held (403).
    MissingRole,
}

impl Denial {
    pub fn status_code(&self) -> u16 {
        match self {
            Denial::NoToken => 401,
            Denial::InvalidIdentity | Denial::NotWhitelisted | Denial::MissingRole => 403,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Carries the decoded identity when a credential was presented.
    Allow(Option<IdentityClaim>),
    Deny(Denial),
}

/// User-facing text for each deny body.
#[derive(Debug, Clone)]
pub struct DenyMessages {
    pub no_token: String,
    pub whitelist: String,
    pub missing_role: String,
}

impl From<&AuthConfig> for DenyMessages {
    fn from(config: &AuthConfig) -> Self {
        Self {
            no_token: config.no_token_message.clone(),
            whitelist: config.whitelist_message.clone(),
            missing_role: config.missing_role_message.clone(),
        }
    }
}

/// Decides whether a request may reach application logic.
pub struct AuthGate {
    authority: Arc<dyn WhitelistAuthority>,
    messages: DenyMessages,
}

impl AuthGate {
    pub fn new(authority: Arc<dyn WhitelistAuthority>, messages: DenyMessages) -> Self {
        Self { authority, messages }
    }

    /// Run the policy checks for one request.
    ///
    /// `policy` is the resolved route policy (`None` when the route is
    /// open) and `credential` the raw header value, if any.
    pub fn evaluate(&self, policy: Option<&RoutePolicy>, credential: Option<&str>) -> GateOutcome {
        let Some(policy) = policy else {
            return GateOutcome::Allow(None);
        };

        let credential = credential.map(str::trim).filter(|c| !c.is_empty());
        let Some(credential) = credential else {
            return if policy.required {
                GateOutcome::Deny(Denial::NoToken)
            } else {
                GateOutcome::Allow(None)
            };
        };

        let claim = match decode_credential(credential) {
            Some(claim) if claim.user_id.is_some() => claim,
            _ => return GateOutcome::Deny(Denial::InvalidIdentity),
        };
        let user_id = claim.user_id.as_deref().unwrap_or_default();

        match self.authority.is_whitelisted(user_id) {
            Ok(true) => {}
            Ok(false) => return GateOutcome::Deny(Denial::NotWhitelisted),
            Err(e) => {
                tracing::error!("Whitelist lookup failed for user '{}': {}", user_id, e);
                return GateOutcome::Deny(Denial::NotWhitelisted);
            }
        }

        if !policy.permits(&claim.role_names) {
            tracing::warn!(
                "Missing required role: user='{}' required={:?} held={:?}",
                user_id,
                policy.role_names,
                claim.role_names
            );
            return GateOutcome::Deny(Denial::MissingRole);
        }

        GateOutcome::Allow(Some(claim))
    }

    /// The boundary response for a denial.
    pub fn deny_error(&self, denial: Denial) -> ApiError {
        match denial {
            Denial::NoToken => ApiError::unauthorized(self.messages.no_token.clone()),
            Denial::InvalidIdentity | Denial::NotWhitelisted => {
                ApiError::forbidden(self.messages.whitelist.clone())
            }
            Denial::MissingRole => ApiError::forbidden(self.messages.missing_role.clone()),
        }
    }

    pub fn authority(&self) -> &Arc<dyn WhitelistAuthority> {
        &self.authority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::whitelist::{StaticWhitelist, WhitelistError};
    use serde_json::json;

    struct BrokenAuthority;

    impl WhitelistAuthority for BrokenAuthority {
        fn is_whitelisted(&self, _user_id: &str) -> Result<bool, WhitelistError> {
            Err(WhitelistError::Unavailable("store offline".into()))
        }

        fn role_of(&self, _user_id: &str) -> Result<Option<String>, WhitelistError> {
            Err(WhitelistError::Unavailable("store offline".into()))
        }
    }

    fn messages() -> DenyMessages {
        DenyMessages {
            no_token: "no token".into(),
            whitelist: "not whitelisted".into(),
            missing_role: "missing role".into(),
        }
    }

    fn gate() -> AuthGate {
        let whitelist = StaticWhitelist::parse_inline("u1:USER,u2:ADMIN").unwrap();
        AuthGate::new(Arc::new(whitelist), messages())
    }

    fn admin_policy() -> RoutePolicy {
        RoutePolicy::required().with_roles(["ADMIN"])
    }

    #[test]
    fn open_route_allows_without_checks() {
        assert_eq!(gate().evaluate(None, Some("garbage")), GateOutcome::Allow(None));
    }

    #[test]
    fn missing_header_on_required_route_is_401() {
        let gate = gate();
        assert_eq!(
            gate.evaluate(Some(&admin_policy()), None),
            GateOutcome::Deny(Denial::NoToken)
        );
        assert_eq!(
            gate.evaluate(Some(&admin_policy()), Some("   ")),
            GateOutcome::Deny(Denial::NoToken)
        );
    }

    #[test]
    fn missing_header_on_optional_route_is_allowed() {
        assert_eq!(
            gate().evaluate(Some(&RoutePolicy::optional()), None),
            GateOutcome::Allow(None)
        );
    }

    #[test]
    fn optional_route_still_checks_presented_credential() {
        assert_eq!(
            gate().evaluate(Some(&RoutePolicy::optional()), Some(r#"{"userId":"u9"}"#)),
            GateOutcome::Deny(Denial::NotWhitelisted)
        );
    }

    #[test]
    fn malformed_credential_is_403_not_401() {
        let gate = gate();
        let outcome = gate.evaluate(Some(&RoutePolicy::required()), Some("not json at all"));
        assert_eq!(outcome, GateOutcome::Deny(Denial::InvalidIdentity));
        assert_eq!(Denial::InvalidIdentity.status_code(), 403);

        let outcome = gate.evaluate(Some(&RoutePolicy::required()), Some(r#"{"userName":"x"}"#));
        assert_eq!(outcome, GateOutcome::Deny(Denial::InvalidIdentity));
    }

    #[test]
    fn unknown_user_is_not_whitelisted() {
        let outcome = gate().evaluate(Some(&admin_policy()), Some(r#"{"userId":"u9"}"#));
        assert_eq!(outcome, GateOutcome::Deny(Denial::NotWhitelisted));
    }

    #[test]
    fn whitelisted_user_without_role_is_rejected() {
        // base64 of {"userId":"u1"}
        let outcome = gate().evaluate(Some(&admin_policy()), Some("eyJ1c2VySWQiOiJ1MSJ9"));
        assert_eq!(outcome, GateOutcome::Deny(Denial::MissingRole));

        let outcome = gate().evaluate(
            Some(&admin_policy()),
            Some(r#"{"userId":"u1","roleNames":["USER"]}"#),
        );
        assert_eq!(outcome, GateOutcome::Deny(Denial::MissingRole));
    }

    #[test]
    fn matching_role_is_allowed_with_claim() {
        let outcome = gate().evaluate(
            Some(&admin_policy()),
            Some(r#"{"userId":"u2","roles":"READER, ADMIN"}"#),
        );
        match outcome {
            GateOutcome::Allow(Some(claim)) => assert_eq!(claim.user_id.as_deref(), Some("u2")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn whitelisted_user_passes_roleless_policy() {
        let outcome = gate().evaluate(Some(&RoutePolicy::required()), Some(r#"{"uid":"u1"}"#));
        assert!(matches!(outcome, GateOutcome::Allow(Some(_))));
    }

    #[test]
    fn authority_failure_fails_closed() {
        let gate = AuthGate::new(Arc::new(BrokenAuthority), messages());
        let outcome = gate.evaluate(Some(&RoutePolicy::required()), Some(r#"{"userId":"u1"}"#));
        assert_eq!(outcome, GateOutcome::Deny(Denial::NotWhitelisted));
    }

    #[test]
    fn deny_bodies_carry_message_and_code() {
        let gate = gate();
        assert_eq!(
            gate.deny_error(Denial::NoToken).to_json(),
            json!({ "error": "no token", "code": 401 })
        );
        assert_eq!(
            gate.deny_error(Denial::NotWhitelisted).to_json(),
            json!({ "error": "not whitelisted", "code": 403 })
        );
        assert_eq!(
            gate.deny_error(Denial::InvalidIdentity).to_json(),
            json!({ "error": "not whitelisted", "code": 403 })
        );
        assert_eq!(
            gate.deny_error(Denial::MissingRole).to_json(),
            json!({ "error": "missing role", "code": 403 })
        );
    }
}
