//! Path → view routing with access guarding.

use fleetadmin_auth::{
    AccessDecision, AccessRequirement, GuardOutcome, Permission, Role, SessionState, permits,
};
use serde::Serialize;

use crate::session::SessionHandle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Dashboard,
    Staff,
    Drivers,
    Penalties,
    AuditLog,
    Unauthorized,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Login,
        Route::Dashboard,
        Route::Staff,
        Route::Drivers,
        Route::Penalties,
        Route::AuditLog,
        Route::Unauthorized,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/",
            Route::Staff => "/staff",
            Route::Drivers => "/drivers",
            Route::Penalties => "/penalties",
            Route::AuditLog => "/audit-log",
            Route::Unauthorized => "/unauthorized",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Dashboard => "Dashboard",
            Route::Staff => "Staff Management",
            Route::Drivers => "Driver Approval",
            Route::Penalties => "Penalties",
            Route::AuditLog => "Audit Log",
            Route::Unauthorized => "Unauthorized",
        }
    }

    /// Declared requirement; `None` marks a public route.
    pub fn requirement(&self) -> Option<AccessRequirement> {
        match self {
            Route::Login | Route::Unauthorized => None,
            Route::Dashboard => Some(AccessRequirement::authenticated()),
            Route::Staff | Route::AuditLog => Some(AccessRequirement::roles([Role::Admin])),
            Route::Drivers => Some(AccessRequirement::permissions([Permission::APPROVE_DRIVERS])),
            Route::Penalties => Some(AccessRequirement::permissions([Permission::ADD_PENALTIES])),
        }
    }

    /// Protected routes are the navigation menu.
    pub fn in_menu(&self) -> bool {
        self.requirement().is_some()
    }

    /// Match a location; query string, fragment and trailing slash are ignored.
    pub fn from_path(location: &str) -> Option<Route> {
        let path = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();
        let path = path.trim_end_matches('/');
        let path = if path.is_empty() { "/" } else { path };
        Route::ALL.into_iter().find(|r| r.path() == path)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "route", rename_all = "snake_case")]
pub enum RouteOutcome {
    /// Session still being validated; show a neutral placeholder.
    Loading,
    Render(Route),
    Redirect(Route),
}

/// Resolve a location against a session state.
pub fn resolve(location: &str, state: &SessionState) -> RouteOutcome {
    let Some(route) = Route::from_path(location) else {
        tracing::debug!(%location, "unknown path");
        return RouteOutcome::Redirect(Route::Dashboard);
    };

    let Some(requirement) = route.requirement() else {
        return match route {
            Route::Login if state.is_loading() => RouteOutcome::Loading,
            Route::Login if state.is_authenticated() => RouteOutcome::Redirect(Route::Dashboard),
            _ => RouteOutcome::Render(route),
        };
    };

    match state.guard(&requirement) {
        GuardOutcome::Loading => RouteOutcome::Loading,
        GuardOutcome::Decided(AccessDecision::Allow) => RouteOutcome::Render(route),
        GuardOutcome::Decided(AccessDecision::RedirectLogin) => RouteOutcome::Redirect(Route::Login),
        GuardOutcome::Decided(AccessDecision::RedirectUnauthorized) => {
            tracing::debug!(?route, "access denied");
            RouteOutcome::Redirect(Route::Unauthorized)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub route: Route,
    pub title: &'static str,
    pub path: &'static str,
}

/// Menu entries visible to a session state.
///
/// Uses the same predicate as the guard: an entry appears exactly when
/// following it would render.
pub fn menu(state: &SessionState) -> Vec<MenuEntry> {
    let Some(session) = state.session() else {
        return Vec::new();
    };
    Route::ALL
        .into_iter()
        .filter_map(|route| route.requirement().map(|req| (route, req)))
        .filter(|(_, req)| permits(session, req))
        .map(|(route, _)| MenuEntry {
            route,
            title: route.title(),
            path: route.path(),
        })
        .collect()
}

/// Router bound to a live session.
#[derive(Debug, Clone)]
pub struct Router {
    session: SessionHandle,
}

impl Router {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }

    pub fn resolve(&self, location: &str) -> RouteOutcome {
        resolve(location, &self.session.current())
    }

    /// Follow redirects until a route renders (or loading).
    pub fn navigate(&self, location: &str) -> RouteOutcome {
        let state = self.session.current();
        let mut outcome = resolve(location, &state);
        // Redirect targets are login, dashboard or unauthorized; two hops settle.
        for _ in 0..3 {
            match outcome {
                RouteOutcome::Redirect(target) => {
                    let next = resolve(target.path(), &state);
                    if next == RouteOutcome::Render(target) {
                        return next;
                    }
                    outcome = next;
                }
                other => return other,
            }
        }
        outcome
    }

    pub fn menu(&self) -> Vec<MenuEntry> {
        menu(&self.session.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetadmin_auth::Session;
    use fleetadmin_core::SubjectId;
    use std::sync::Arc;

    fn authed(role: Role, perms: &[&'static str]) -> SessionState {
        SessionState::Authenticated(Arc::new(Session::new(
            SubjectId::new("u"),
            role,
            perms.iter().map(|p| Permission::new(*p)),
            "User",
        )))
    }

    #[test]
    fn path_matching_ignores_query_and_trailing_slash() {
        assert_eq!(Route::from_path("/staff/"), Some(Route::Staff));
        assert_eq!(Route::from_path("/audit-log?page=2"), Some(Route::AuditLog));
        assert_eq!(Route::from_path(""), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/nope"), None);
    }

    #[test]
    fn unknown_paths_go_home() {
        assert_eq!(
            resolve("/settings", &SessionState::Unauthenticated),
            RouteOutcome::Redirect(Route::Dashboard)
        );
    }

    #[test]
    fn login_redirects_when_signed_in() {
        assert_eq!(
            resolve("/login", &authed(Role::Staff, &[])),
            RouteOutcome::Redirect(Route::Dashboard)
        );
        assert_eq!(
            resolve("/login", &SessionState::Unauthenticated),
            RouteOutcome::Render(Route::Login)
        );
        assert_eq!(resolve("/login", &SessionState::Unknown), RouteOutcome::Loading);
    }

    #[test]
    fn protected_routes_follow_the_guard() {
        let staff = authed(Role::Staff, &["add_penalties"]);
        assert_eq!(resolve("/drivers", &staff), RouteOutcome::Redirect(Route::Unauthorized));
        assert_eq!(resolve("/penalties", &staff), RouteOutcome::Render(Route::Penalties));
        assert_eq!(resolve("/staff", &staff), RouteOutcome::Redirect(Route::Unauthorized));
        assert_eq!(
            resolve("/", &SessionState::Unauthenticated),
            RouteOutcome::Redirect(Route::Login)
        );
        assert_eq!(resolve("/staff", &SessionState::Unknown), RouteOutcome::Loading);
    }

    #[test]
    fn menu_matches_route_resolution() {
        let states = [
            SessionState::Unknown,
            SessionState::Unauthenticated,
            authed(Role::Admin, &[]),
            authed(Role::Staff, &[]),
            authed(Role::Staff, &["add_penalties"]),
            authed(Role::Staff, &["approve_drivers"]),
            authed(Role::Staff, &["approve_drivers", "add_penalties", "other"]),
        ];

        for state in &states {
            let visible: Vec<Route> = menu(state).into_iter().map(|e| e.route).collect();
            for route in Route::ALL.into_iter().filter(Route::in_menu) {
                let renders = resolve(route.path(), state) == RouteOutcome::Render(route);
                assert_eq!(
                    visible.contains(&route),
                    renders,
                    "menu/guard divergence for {route:?} in {state:?}"
                );
            }
        }
    }

    #[test]
    fn admin_sees_every_menu_entry() {
        let entries = menu(&authed(Role::Admin, &[]));
        assert_eq!(entries.len(), 5);
    }
}
