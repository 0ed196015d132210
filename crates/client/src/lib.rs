//! `fleetadmin-client`
//!
//! **Responsibility:** the administrative console's client core.
//!
//! This crate provides:
//! - Credential persistence and startup re-validation
//! - The session provider (single writer, many readers)
//! - Route resolution guarded by the access policy
//! - Typed REST bindings and view controllers with scoped fetches
//!
//! Rendering is left to whatever front-end embeds it.

pub mod api;
pub mod app;
pub mod config;
pub mod credential;
pub mod notify;
pub mod resources;
pub mod router;
pub mod scope;
pub mod session;
pub mod types;
pub mod validator;
pub mod views;

pub use api::{ApiClient, ApiError};
pub use app::App;
pub use config::ClientConfig;
pub use credential::{CREDENTIAL_KEY, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use notify::{ChannelNotifier, Level, LogNotifier, Notification, Notifier};
pub use router::{MenuEntry, Route, RouteOutcome, Router};
pub use session::{SessionError, SessionHandle, SessionProvider};
