//! Startup re-validation of a stored credential.

use std::sync::Arc;

use fleetadmin_auth::{SessionState, session_from_token};

use crate::api::ApiClient;
use crate::credential::CredentialStore;

/// Turns a stored credential into a session, or discards it.
///
/// A stored token is never trusted on its own: the server must accept it
/// before its claims are decoded into a session.
#[derive(Clone)]
pub struct SessionValidator {
    api: ApiClient,
    credentials: Arc<dyn CredentialStore>,
}

impl SessionValidator {
    pub fn new(api: ApiClient, credentials: Arc<dyn CredentialStore>) -> Self {
        Self { api, credentials }
    }

    /// Resolve the settled state. Never returns `Unknown`.
    pub async fn restore(&self) -> SessionState {
        let token = match self.credentials.load() {
            Ok(Some(token)) => token,
            Ok(None) => {
                tracing::debug!("no stored credential");
                return SessionState::Unauthenticated;
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored credential unreadable; discarding");
                self.discard();
                return SessionState::Unauthenticated;
            }
        };

        if let Err(e) = self.api.validate(&token).await {
            tracing::info!(error = %e, "stored credential rejected; discarding");
            self.discard();
            return SessionState::Unauthenticated;
        }

        match session_from_token(&token) {
            Ok(session) => {
                tracing::info!(
                    subject = %session.subject_id,
                    role = %session.role,
                    "session restored"
                );
                SessionState::Authenticated(Arc::new(session))
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored credential has unusable claims; discarding");
                self.discard();
                SessionState::Unauthenticated
            }
        }
    }

    fn discard(&self) {
        if let Err(e) = self.credentials.clear() {
            tracing::error!(error = %e, "failed to clear stored credential");
        }
    }
}
