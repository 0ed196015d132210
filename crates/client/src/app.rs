//! Application wiring shared by the binary and tests.

use std::sync::Arc;

use fleetadmin_auth::SessionState;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::credential::{CredentialStore, FileCredentialStore};
use crate::notify::Notifier;
use crate::resources::Resources;
use crate::router::Router;
use crate::session::{SessionHandle, SessionProvider};
use crate::views::ViewContext;

/// Everything a console front-end needs, built once at startup.
#[derive(Clone)]
pub struct App {
    pub credentials: Arc<dyn CredentialStore>,
    pub api: ApiClient,
    pub session: Arc<SessionProvider>,
    pub notifier: Arc<dyn Notifier>,
}

impl App {
    /// Build from configuration with a file-backed credential store.
    pub fn from_config(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Self {
        let credentials: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(config.credential_path.clone()));
        Self::with_store(&config.api_url, credentials, notifier)
    }

    pub fn with_store(
        api_url: &str,
        credentials: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let api = ApiClient::new(api_url, Arc::clone(&credentials));
        let session = Arc::new(SessionProvider::new(
            api.clone(),
            Arc::clone(&credentials),
            Arc::clone(&notifier),
        ));
        Self {
            credentials,
            api,
            session,
            notifier,
        }
    }

    /// Validate any stored credential; call once before routing.
    pub async fn start(&self) -> SessionState {
        let state = self.session.initialize().await;
        tracing::info!(authenticated = state.is_authenticated(), "session initialized");
        state
    }

    pub fn session_handle(&self) -> SessionHandle {
        self.session.handle()
    }

    pub fn router(&self) -> Router {
        Router::new(self.session.handle())
    }

    pub fn view_context(&self) -> ViewContext {
        ViewContext::new(
            Resources::new(self.api.clone()),
            Arc::clone(&self.session),
            Arc::clone(&self.notifier),
        )
    }
}
