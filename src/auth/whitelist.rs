use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WhitelistError {
    #[error("Whitelist unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to read whitelist file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid whitelist file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid whitelist entry: {0}")]
    InvalidEntry(String),
}

/// Membership and role store consulted by the authorization gate.
///
/// Lookups are synchronous and never mutate the store.
pub trait WhitelistAuthority: Send + Sync {
    fn is_whitelisted(&self, user_id: &str) -> Result<bool, WhitelistError>;

    fn role_of(&self, user_id: &str) -> Result<Option<String>, WhitelistError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct WhitelistFile {
    #[serde(default)]
    users: Vec<WhitelistEntry>,
}

/// Whitelist held in memory, seeded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticWhitelist {
    entries: HashMap<String, WhitelistEntry>,
}

impl StaticWhitelist {
    pub fn new(entries: impl IntoIterator<Item = WhitelistEntry>) -> Self {
        let entries = entries
            .into_iter()
            .filter(|e| !e.user_id.trim().is_empty())
            .map(|e| (e.user_id.trim().to_string(), e))
            .collect();
        Self { entries }
    }

    /// Parse the inline form `user[:ROLE],user[:ROLE]`.
    pub fn parse_inline(list: &str) -> Result<Self, WhitelistError> {
        let mut entries = Vec::new();
        for item in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (user_id, role) = match item.split_once(':') {
                Some((user, role)) => (user.trim(), Some(role.trim())),
                None => (item, None),
            };
            if user_id.is_empty() {
                return Err(WhitelistError::InvalidEntry(item.to_string()));
            }
            entries.push(WhitelistEntry {
                user_id: user_id.to_string(),
                role: role.filter(|r| !r.is_empty()).map(str::to_string),
                active: true,
            });
        }
        Ok(Self::new(entries))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, WhitelistError> {
        let file: WhitelistFile = serde_yaml::from_str(yaml)?;
        Ok(Self::new(file.users))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, WhitelistError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Combine two seeds; entries in `other` replace same-id entries here.
    pub fn merge(mut self, other: StaticWhitelist) -> Self {
        self.entries.extend(other.entries);
        self
    }

    /// All entries sorted by user id.
    pub fn entries(&self) -> Vec<WhitelistEntry> {
        let mut entries: Vec<WhitelistEntry> = self.entries.values().cloned().collect();
        entries.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn active_entry(&self, user_id: &str) -> Option<&WhitelistEntry> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return None;
        }
        self.entries.get(user_id).filter(|e| e.active)
    }
}

impl WhitelistAuthority for StaticWhitelist {
    fn is_whitelisted(&self, user_id: &str) -> Result<bool, WhitelistError> {
        Ok(self.active_entry(user_id).is_some())
    }

    fn role_of(&self, user_id: &str) -> Result<Option<String>, WhitelistError> {
        Ok(self.active_entry(user_id).and_then(|e| e.role.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn inline_seed_parses_roles() {
        let whitelist = StaticWhitelist::parse_inline("u1:ADMIN, u2 ,u3:").unwrap();
        assert_eq!(whitelist.len(), 3);
        assert!(whitelist.is_whitelisted("u1").unwrap());
        assert_eq!(whitelist.role_of("u1").unwrap().as_deref(), Some("ADMIN"));
        assert_eq!(whitelist.role_of("u2").unwrap(), None);
        assert_eq!(whitelist.role_of("u3").unwrap(), None);
        assert!(!whitelist.is_whitelisted("u9").unwrap());
        assert!(!whitelist.is_whitelisted("").unwrap());
    }

    #[test]
    fn inline_seed_rejects_missing_user() {
        assert!(matches!(
            StaticWhitelist::parse_inline(":ADMIN"),
            Err(WhitelistError::InvalidEntry(_))
        ));
    }

    #[test]
    fn inactive_entries_are_not_whitelisted() {
        let whitelist = StaticWhitelist::from_yaml_str(
            "users:\n  - user_id: u1\n    role: OPERATOR\n  - user_id: u2\n    role: ADMIN\n    active: false\n",
        )
        .unwrap();
        assert!(whitelist.is_whitelisted("u1").unwrap());
        assert!(!whitelist.is_whitelisted("u2").unwrap());
        assert_eq!(whitelist.role_of("u2").unwrap(), None);
    }

    #[test]
    fn loads_yaml_file_and_merges() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "users:\n  - user_id: file_user\n    role: READER").unwrap();

        let whitelist = StaticWhitelist::parse_inline("inline_user:ADMIN")
            .unwrap()
            .merge(StaticWhitelist::from_yaml_file(file.path()).unwrap());

        let ids: Vec<String> = whitelist.entries().into_iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec!["file_user".to_string(), "inline_user".to_string()]);
    }
}
