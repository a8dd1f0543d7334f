use serde::{Deserialize, Serialize};

use crate::constants::CHAT_ID_SEPARATOR;
use crate::error::SharedError;

// User identity = the stable principal id assigned by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a raw principal id, rejecting empty strings.
    pub fn parse(id: impl Into<String>) -> Result<Self, SharedError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SharedError::EmptyId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log output.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a two-party chat session.
///
/// Derived, not generated: the two participant ids sorted lexicographically
/// and joined with a separator, so both sides of a conversation compute the
/// same id and concurrent first contacts collide on one document instead of
/// creating two.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
    /// Canonical session id for an unordered pair of participants.
    pub fn for_pair(a: &UserId, b: &UserId) -> Self {
        let (lo, hi) = if a.as_str() <= b.as_str() {
            (a, b)
        } else {
            (b, a)
        };
        Self(format!("{}{}{}", lo, CHAT_ID_SEPARATOR, hi))
    }

    /// Re-wrap an id previously produced by [`ChatId::for_pair`].
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
