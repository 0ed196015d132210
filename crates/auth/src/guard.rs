//! Route access policy.
//!
//! - No IO
//! - No panics
//! - Same predicate for the route guard and for menu visibility

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{Permission, Role, Session, SessionState};

/// What a view demands of the session before it may render.
///
/// Both sets empty means "any authenticated user". When both are set, the
/// role check runs first and the permission check second.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccessRequirement {
    pub roles: BTreeSet<Role>,
    pub permissions: BTreeSet<Permission>,
}

impl AccessRequirement {
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
            permissions: BTreeSet::new(),
        }
    }

    pub fn permissions(permissions: impl IntoIterator<Item = Permission>) -> Self {
        Self {
            roles: BTreeSet::new(),
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Allow,
    RedirectLogin,
    RedirectUnauthorized,
}

/// Guard result including the transient loading state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Startup validation still running; render a neutral placeholder.
    Loading,
    Decided(AccessDecision),
}

/// Whether an authenticated session satisfies a requirement.
///
/// Admin bypasses every permission list. A permission list is satisfied by
/// holding any one of its entries.
pub fn permits(session: &Session, requirement: &AccessRequirement) -> bool {
    if !requirement.roles.is_empty() && !requirement.roles.contains(&session.role) {
        return false;
    }

    if !requirement.permissions.is_empty() {
        return session.is_admin()
            || requirement
                .permissions
                .iter()
                .any(|p| session.permissions.contains(p));
    }

    true
}

/// Decide access for a settled session (present or absent).
pub fn evaluate(session: Option<&Session>, requirement: &AccessRequirement) -> AccessDecision {
    match session {
        None => AccessDecision::RedirectLogin,
        Some(session) if permits(session, requirement) => AccessDecision::Allow,
        Some(_) => AccessDecision::RedirectUnauthorized,
    }
}

/// Full guard contract: loading first, then [`evaluate`].
pub fn decide(
    session: Option<&Session>,
    loading: bool,
    requirement: &AccessRequirement,
) -> GuardOutcome {
    if loading {
        return GuardOutcome::Loading;
    }
    GuardOutcome::Decided(evaluate(session, requirement))
}

impl SessionState {
    /// Run the guard against this state.
    pub fn guard(&self, requirement: &AccessRequirement) -> GuardOutcome {
        decide(self.session(), self.is_loading(), requirement)
    }
}
