use axum::http::Method;
use std::collections::{BTreeSet, HashMap};

/// Per-endpoint authorization requirement.
///
/// The default (`required`, no roles) admits any whitelisted identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    pub required: bool,
    pub role_names: BTreeSet<String>,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::required()
    }
}

impl RoutePolicy {
    pub fn required() -> Self {
        Self {
            required: true,
            role_names: BTreeSet::new(),
        }
    }

    /// Anonymous requests pass; a credential that is present is still checked.
    pub fn optional() -> Self {
        Self {
            required: false,
            role_names: BTreeSet::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role_names = roles
            .into_iter()
            .map(|r| Into::<String>::into(r).trim().to_string())
            .filter(|r| !r.is_empty())
            .collect();
        self
    }

    /// True when no roles are demanded or `roles` holds at least one of them.
    /// Matching is exact and case-sensitive.
    pub fn permits(&self, roles: &BTreeSet<String>) -> bool {
        self.role_names.is_empty() || self.role_names.iter().any(|r| roles.contains(r))
    }
}

/// Static route-to-policy mapping built at startup.
///
/// Scope entries cover every route under a path prefix (the equivalent of
/// annotating a whole controller); route entries target one method on one
/// route template and take precedence over any scope.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    scopes: Vec<(String, RoutePolicy)>,
    routes: HashMap<(Method, String), RoutePolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, prefix: impl Into<String>, policy: RoutePolicy) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        self.scopes.retain(|(p, _)| *p != prefix);
        self.scopes.push((prefix, policy));
        self
    }

    pub fn route(mut self, method: Method, path: impl Into<String>, policy: RoutePolicy) -> Self {
        self.routes.insert((method, path.into()), policy);
        self
    }

    /// Effective policy for a matched route, or `None` when the route is open.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<&RoutePolicy> {
        if let Some(policy) = self.routes.get(&(method.clone(), path.to_string())) {
            return Some(policy);
        }

        self.scopes
            .iter()
            .filter(|(prefix, _)| Self::in_scope(prefix, path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, policy)| policy)
    }

    fn in_scope(prefix: &str, path: &str) -> bool {
        match path.strip_prefix(prefix) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}
