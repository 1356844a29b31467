//! Caller identity.
//!
//! Identity is always resolved by the request layer and handed to each
//! operation as an explicit `Option<&UserId>`; nothing in the crate reads it
//! from ambient state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque user identity issued by the external auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Returns `None` for blank identities.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Rehydrate an identity previously persisted by the store.
    pub(crate) fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whatever the request layer knows about the caller.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
        }
    }
}

pub fn resolve_caller_identity(ctx: &RequestContext) -> Option<UserId> {
    ctx.user.as_deref().and_then(UserId::parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_caller_identity() {
        assert_eq!(
            resolve_caller_identity(&RequestContext::for_user(" alice ")),
            UserId::parse("alice")
        );
        assert_eq!(resolve_caller_identity(&RequestContext::for_user("   ")), None);
        assert_eq!(resolve_caller_identity(&RequestContext::anonymous()), None);
    }
}
