use base64::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::BTreeSet;

/// Identity decoded from the credential header.
///
/// `user_id` is the only whitelist key: a claim without one is never
/// authorized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityClaim {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    #[serde(rename = "roleNames")]
    pub role_names: BTreeSet<String>,
}

impl IdentityClaim {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role_names = normalize_roles(roles.into_iter().map(Into::into));
        self
    }

    /// Encode as the base64 JSON form accepted by [`decode_credential`].
    pub fn to_credential(&self) -> Result<String, serde_json::Error> {
        Ok(BASE64_STANDARD.encode(serde_json::to_vec(self)?))
    }
}

/// Claim fields as sent, before normalization.
struct RawClaim {
    user_id: Option<IdValue>,
    user_name: Option<String>,
    role_names: Option<RoleNames>,
}

impl RawClaim {
    /// Read the claim from a JSON object; for each field the first
    /// non-null alias wins.
    fn from_object(object: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        Ok(Self {
            user_id: alias_field(object, &["userId", "uid"])?,
            user_name: alias_field(object, &["userName", "username", "name"])?,
            role_names: alias_field(object, &["roleNames", "roles"])?,
        })
    }
}

fn alias_field<T: DeserializeOwned>(
    object: &Map<String, Value>,
    keys: &[&str],
) -> Result<Option<T>, serde_json::Error> {
    match keys.iter().find_map(|key| object.get(*key).filter(|v| !v.is_null())) {
        Some(value) => serde_json::from_value(value.clone()).map(Some),
        None => Ok(None),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoleNames {
    List(Vec<String>),
    Delimited(String),
}

impl From<RawClaim> for IdentityClaim {
    fn from(raw: RawClaim) -> Self {
        let user_id = raw
            .user_id
            .map(|id| match id {
                IdValue::Text(s) => s.trim().to_string(),
                IdValue::Number(n) => n.to_string(),
            })
            .filter(|id| !id.is_empty());

        let role_names = match raw.role_names {
            Some(RoleNames::List(roles)) => normalize_roles(roles),
            Some(RoleNames::Delimited(roles)) => {
                normalize_roles(roles.split(',').map(str::to_string))
            }
            None => BTreeSet::new(),
        };

        Self {
            user_id,
            user_name: raw.user_name,
            role_names,
        }
    }
}

fn normalize_roles(roles: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    roles
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}

fn looks_like_json(text: &str) -> bool {
    text.starts_with('{') || text.starts_with('[')
}

/// Decode a credential header value into an [`IdentityClaim`].
///
/// Accepts literal JSON, or standard base64 of JSON. Anything that does
/// not parse yields `None`; callers must treat that as unauthenticated.
pub fn decode_credential(raw: &str) -> Option<IdentityClaim> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let json: Cow<'_, str> = if looks_like_json(trimmed) {
        Cow::Borrowed(trimmed)
    } else {
        match BASE64_STANDARD.decode(trimmed) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(text) if looks_like_json(text.trim()) => Cow::Owned(text),
                _ => Cow::Borrowed(trimmed),
            },
            Err(_) => Cow::Borrowed(trimmed),
        }
    };

    let object = match serde_json::from_str::<Value>(&json) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            tracing::debug!("Credential JSON is not an object");
            return None;
        }
        Err(e) => {
            tracing::debug!("Failed to parse credential as JSON: {}", e);
            return None;
        }
    };

    match RawClaim::from_object(&object) {
        Ok(claim) => Some(claim.into()),
        Err(e) => {
            tracing::debug!("Credential fields have unexpected types: {}", e);
            None
        }
    }
}
