//! Session provider: the single writer of the current [`SessionState`].
//!
//! Readers (router, views, menus) hold a [`SessionHandle`] handed to them
//! explicitly; only the provider's `initialize`/`login`/`logout`/`expire`
//! change what they see.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use fleetadmin_auth::{AccessRequirement, GuardOutcome, Role, Session, SessionState, session_from_token};

use crate::api::ApiClient;
use crate::credential::{CredentialError, CredentialStore};
use crate::notify::{Notification, Notifier};
use crate::validator::SessionValidator;

pub const LOGIN_FAILED: &str = "Login failed";
pub const LOGIN_SUCCEEDED: &str = "Logged in successfully";
pub const LOGGED_OUT: &str = "Logged out";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";

#[derive(Debug, Error)]
pub enum SessionError {
    /// Shown to the user as-is.
    #[error("{0}")]
    LoginFailed(String),

    #[error("role '{0}' cannot sign in to the console")]
    UnsupportedRole(Role),

    #[error("already signed in; log out first")]
    AlreadyAuthenticated,

    #[error(transparent)]
    Storage(#[from] CredentialError),
}

/// Read side of the session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    rx: watch::Receiver<SessionState>,
}

impl SessionHandle {
    pub fn current(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        match &*self.rx.borrow() {
            SessionState::Authenticated(session) => Some(Arc::clone(session)),
            _ => None,
        }
    }

    pub fn guard(&self, requirement: &AccessRequirement) -> GuardOutcome {
        self.rx.borrow().guard(requirement)
    }

    /// Wait for the next published state.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until startup validation has settled.
    pub async fn settled(&mut self) -> SessionState {
        match self.rx.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => SessionState::Unauthenticated,
        }
    }
}

pub struct SessionProvider {
    api: ApiClient,
    credentials: Arc<dyn CredentialStore>,
    validator: SessionValidator,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionState>,
}

impl SessionProvider {
    pub fn new(
        api: ApiClient,
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let validator = SessionValidator::new(api.clone(), Arc::clone(&credentials));
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            api,
            credentials,
            validator,
            notifier,
            state,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            rx: self.state.subscribe(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    fn publish(&self, next: SessionState) {
        self.state.send_replace(next);
    }

    /// Run startup validation once and publish the settled state.
    pub async fn initialize(&self) -> SessionState {
        let settled = self.validator.restore().await;
        self.publish(settled.clone());
        settled
    }

    /// Sign in against the role-specific endpoint.
    pub async fn login(
        &self,
        role: Role,
        email: &str,
        password: &str,
    ) -> Result<Arc<Session>, SessionError> {
        if !role.can_sign_in() {
            return Err(SessionError::UnsupportedRole(role));
        }
        if self.state.borrow().is_authenticated() {
            return Err(SessionError::AlreadyAuthenticated);
        }

        let response = match self.api.login(role, email.trim(), password).await {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(%role, error = %e, "login rejected");
                let message = e.user_message(LOGIN_FAILED);
                self.notifier.notify(Notification::error(message.clone()));
                return Err(SessionError::LoginFailed(message));
            }
        };

        let response_name = response
            .user
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let session = match session_from_token(&response.token) {
            Ok(mut session) => {
                // The login response names the account even when the token does not.
                if let Some(name) = &response_name {
                    session.display_name = name.clone();
                }
                Arc::new(session)
            }
            Err(e) => {
                tracing::warn!(%role, error = %e, "login returned an unusable token");
                self.notifier.notify(Notification::error(LOGIN_FAILED));
                return Err(SessionError::LoginFailed(LOGIN_FAILED.to_string()));
            }
        };

        if let Err(e) = self.credentials.save(&response.token) {
            tracing::error!(error = %e, "failed to persist credential");
            self.notifier.notify(Notification::error(LOGIN_FAILED));
            return Err(e.into());
        }

        tracing::info!(subject = %session.subject_id, role = %session.role, "logged in");
        self.publish(SessionState::Authenticated(Arc::clone(&session)));
        let greeting = response_name
            .map(|name| format!("{LOGIN_SUCCEEDED}. Welcome, {name}"))
            .unwrap_or_else(|| LOGIN_SUCCEEDED.to_string());
        self.notifier.notify(Notification::success(greeting));
        Ok(session)
    }

    /// Drop the credential and the session. Idempotent.
    pub fn logout(&self) {
        self.clear_credential();
        self.publish(SessionState::Unauthenticated);
        tracing::info!("logged out");
        self.notifier.notify(Notification::info(LOGGED_OUT));
    }

    /// Downgrade after the backend rejected the credential mid-session.
    pub fn expire(&self) {
        self.clear_credential();
        let was_authenticated = self.state.borrow().is_authenticated();
        self.publish(SessionState::Unauthenticated);
        if was_authenticated {
            tracing::info!("session expired");
            self.notifier.notify(Notification::error(SESSION_EXPIRED));
        }
    }

    fn clear_credential(&self) {
        if let Err(e) = self.credentials.clear() {
            tracing::error!(error = %e, "failed to clear stored credential");
        }
    }
}
