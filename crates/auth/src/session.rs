use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use fleetadmin_core::SubjectId;

use crate::{Permission, Role};

/// The authenticated user for the current process lifetime.
///
/// Immutable once built; a new login replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub subject_id: SubjectId,
    pub role: Role,
    pub permissions: BTreeSet<Permission>,
    pub display_name: String,
    pub email: Option<String>,
    /// Advisory expiry decoded from the token; the server remains the authority.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(
        subject_id: SubjectId,
        role: Role,
        permissions: impl IntoIterator<Item = Permission>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            subject_id,
            role,
            permissions: permissions.into_iter().collect(),
            display_name: display_name.into(),
            email: None,
            expires_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn holds(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }
}

/// Lifecycle state published by the session provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Startup validation has not finished yet.
    #[default]
    Unknown,
    Unauthenticated,
    Authenticated(Arc<Session>),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Unknown)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }
}
