use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleetadmin_core::SubjectId;

use crate::{Permission, Role, Session};

/// Identity claims carried by a console bearer token.
///
/// These are read client-side without verifying the signature, so they are
/// only turned into a [`Session`] after the server has accepted the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier issued by the console backend.
    #[serde(default)]
    pub id: Option<SubjectId>,

    /// Registered subject claim; used only when `id` is absent.
    #[serde(default)]
    pub sub: Option<SubjectId>,

    pub role: Option<String>,

    #[serde(default)]
    pub permissions: Option<BTreeSet<Permission>>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    /// Expiry as seconds since the epoch.
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClaimsError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token has no subject id")]
    MissingSubject,

    #[error("token has no role")]
    MissingRole,

    #[error("unknown role '{0}' in token")]
    UnknownRole(String),

    #[error("role '{0}' cannot sign in to the console")]
    UnsupportedRole(Role),
}

/// Decode the claims segment of a JWT without checking its signature.
///
/// Expiry and audience are not enforced here either: the validate call owns
/// that decision.
pub fn decode_claims(token: &str) -> Result<TokenClaims, ClaimsError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<TokenClaims>(token.trim(), &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| ClaimsError::Malformed(e.to_string()))
}

impl TokenClaims {
    /// Build a session from decoded claims.
    ///
    /// Missing permissions mean none; a missing display name falls back to
    /// the email and then to the subject id.
    pub fn into_session(self) -> Result<Session, ClaimsError> {
        let subject_id = self.id.or(self.sub).ok_or(ClaimsError::MissingSubject)?;

        let role_name = self.role.ok_or(ClaimsError::MissingRole)?;
        let role: Role = role_name
            .parse()
            .map_err(|_| ClaimsError::UnknownRole(role_name.clone()))?;
        if !role.can_sign_in() {
            return Err(ClaimsError::UnsupportedRole(role));
        }

        let display_name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| subject_id.to_string());

        let expires_at = self
            .exp
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        Ok(Session {
            subject_id,
            role,
            permissions: self.permissions.unwrap_or_default(),
            display_name,
            email: self.email,
            expires_at,
        })
    }
}

/// Decode a token straight into a [`Session`].
pub fn session_from_token(token: &str) -> Result<Session, ClaimsError> {
    decode_claims(token)?.into_session()
}
