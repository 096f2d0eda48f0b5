//! Authenticated identity as reported by the auth collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque user identifier issued by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Uid(String);

impl Uid {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the string representation of this uid.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A signed-in user. Nothing here is owned locally; it mirrors what the
/// auth collaborator reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Unique id, also the per-user segment of every store path.
    pub uid: Uid,
    /// Email address the account was registered with.
    pub email: String,
}

impl Identity {
    /// Creates an identity from its parts.
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: Uid::new(uid),
            email: email.into(),
        }
    }
}
