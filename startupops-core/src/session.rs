//! Signed-in user as seen by the core
//!
//! Credentials are checked by the identity provider. The core only receives
//! whether the user is authenticated, an opaque handle, and the role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::OpsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Founder,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Founder => write!(f, "founder"),
            Role::Member => write!(f, "member"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "founder" => Ok(Role::Founder),
            "member" => Ok(Role::Member),
            _ => anyhow::bail!("Invalid role: {} (expected founder or member)", s),
        }
    }
}

/// Opaque user handle issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHandle(pub String);

impl UserHandle {
    /// A fresh handle for a local, offline session
    pub fn local() -> Self {
        Self(format!("local-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for UserHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
    pub user: Option<UserHandle>,
    pub role: Role,
}

impl Session {
    pub fn signed_in(user: UserHandle, role: Role) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
            role,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            user: None,
            role: Role::Member,
        }
    }

    pub fn require_authenticated(&self) -> Result<(), OpsError> {
        if self.authenticated {
            Ok(())
        } else {
            Err(OpsError::NotAuthenticated)
        }
    }

    /// Checks the session may perform a founder-only `action`
    /// (e.g. "add tasks")
    pub fn require_founder(&self, action: &'static str) -> Result<(), OpsError> {
        self.require_authenticated()?;
        match self.role {
            Role::Founder => Ok(()),
            Role::Member => Err(OpsError::PermissionDenied(action)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_founder_permissions() {
        let session = Session::signed_in(UserHandle::local(), Role::Founder);
        assert!(session.require_authenticated().is_ok());
        assert!(session.require_founder("add tasks").is_ok());
    }

    #[test]
    fn test_member_cannot_do_founder_actions() {
        let session = Session::signed_in(UserHandle("u-42".into()), Role::Member);
        assert_eq!(
            session.require_founder("edit financials"),
            Err(OpsError::PermissionDenied("edit financials"))
        );
        assert!(session.require_authenticated().is_ok());
    }

    #[test]
    fn test_anonymous_session() {
        let session = Session::anonymous();
        assert_eq!(session.require_authenticated(), Err(OpsError::NotAuthenticated));
        assert_eq!(session.require_founder("add tasks"), Err(OpsError::NotAuthenticated));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("Founder".parse::<Role>().unwrap(), Role::Founder);
        assert_eq!("member".parse::<Role>().unwrap(), Role::Member);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_local_handles_are_unique() {
        assert_ne!(UserHandle::local(), UserHandle::local());
        assert!(UserHandle::local().to_string().starts_with("local-"));
    }
}
