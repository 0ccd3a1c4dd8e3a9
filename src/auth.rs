//! Stored auth token and user profile snapshot.
//!
//! Authorization is enforced by the backend; the client only keeps enough to
//! attach a bearer token and to know whose enrollment it is editing.
use crate::storage::{SessionStore, SESSION_KEY};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Coordinator,
    Beneficiary,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Coordinator => "coordinator",
            Role::Beneficiary => "beneficiary",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "coordinator" => Ok(Role::Coordinator),
            "beneficiary" => Ok(Role::Beneficiary),
            other => Err(format!(
                "unknown role {other:?} (expected admin, coordinator, or beneficiary)"
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backends hand out numeric ids; keep them as text.
    #[serde(deserialize_with = "id_as_string")]
    pub user_id: String,
    pub role: Role,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(text) => Ok(text),
        serde_json::Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "user_id must be a string or number, got {other}"
        ))),
    }
}

/// Read the stored session. Missing or corrupt data means "signed out".
pub fn load_session<S: SessionStore>(store: &S) -> Option<AuthSession> {
    let raw = match store.get(SESSION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            tracing::debug!(error = %err, "ignoring unreadable session slot");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::debug!(error = %err, "ignoring corrupt session slot");
            None
        }
    }
}

pub fn save_session<S: SessionStore>(store: &mut S, session: &AuthSession) -> Result<()> {
    let raw = serde_json::to_string(session).context("serialize auth session")?;
    store.set(SESSION_KEY, &raw).context("store auth session")?;
    Ok(())
}

pub fn clear_session<S: SessionStore>(store: &mut S) -> Result<()> {
    store.clear(SESSION_KEY).context("clear auth session")?;
    Ok(())
}

/// Token to send: the environment wins over the stored session.
pub fn resolve_token(session: Option<&AuthSession>, env_token: Option<String>) -> Option<String> {
    env_token
        .filter(|token| !token.trim().is_empty())
        .or_else(|| session.map(|session| session.token.clone()))
}
