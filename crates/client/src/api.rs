//! HTTP bindings to the fleet REST backend.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleetadmin_auth::Role;

use crate::credential::CredentialStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend rejected the credential (or the login attempt).
    #[error("authentication failed")]
    Unauthorized { message: Option<String> },

    #[error("request failed with status {status}")]
    Status { status: u16, message: Option<String> },

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Message supplied by the backend, if any.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message } | ApiError::Status { message, .. } => {
                message.as_deref()
            }
            ApiError::Network(_) | ApiError::Decode(_) | ApiError::InvalidUrl(_) => None,
        }
    }

    /// Text for a notification: the backend's message, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.backend_message().unwrap_or(fallback).to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginUser {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

/// Thin REST client.
///
/// Every request except login carries the stored credential as a bearer
/// header. No retries, no timeout beyond reqwest's default.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Append `segments` to the base url, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ApiError> {
        let req = self.http.request(method, self.url(segments)?);
        Ok(match self.credentials.load() {
            Ok(Some(token)) => req.bearer_auth(token),
            Ok(None) => req,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored credential; sending unauthenticated");
                req
            }
        })
    }

    /// `POST /auth/{role}/login`.
    pub async fn login(
        &self,
        role: Role,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, ApiError> {
        let req = self
            .http
            .post(self.url(&["auth", role.as_str(), "login"])?)
            .json(&LoginRequest { email, password });
        execute_json(req).await
    }

    /// `GET /auth/validate` with an explicit token; any 2xx accepts it.
    pub async fn validate(&self, token: &str) -> Result<(), ApiError> {
        let req = self.http.get(self.url(&["auth", "validate"])?).bearer_auth(token);
        execute_empty(req).await
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        execute_json(self.request(Method::GET, segments)?).await
    }

    pub async fn get_with_query<T, Q>(&self, segments: &[&str], query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        execute_json(self.request(Method::GET, segments)?.query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ApiError> {
        execute_empty(self.request(Method::POST, segments)?.json(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<(), ApiError> {
        execute_empty(self.request(Method::PUT, segments)?.json(body)).await
    }

    pub async fn patch(&self, segments: &[&str]) -> Result<(), ApiError> {
        execute_empty(self.request(Method::PATCH, segments)?).await
    }

    pub async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        execute_empty(self.request(Method::DELETE, segments)?).await
    }
}

async fn send(req: RequestBuilder) -> Result<reqwest::Response, ApiError> {
    let resp = req
        .send()
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = extract_message(&body);
    if status == StatusCode::UNAUTHORIZED {
        Err(ApiError::Unauthorized { message })
    } else {
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

async fn execute_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
    send(req)
        .await?
        .json()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

async fn execute_empty(req: RequestBuilder) -> Result<(), ApiError> {
    send(req).await.map(|_| ())
}

/// Pull a human-readable message out of an error body.
///
/// Accepts `{"message": ".."}` or `{"error": ".."}`; anything else yields none.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
