use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role carried in a session token.
///
/// `Driver` exists on the backend only; drivers never sign in to the
/// administrative console.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Driver,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Driver => "driver",
        }
    }

    /// Whether this role may hold a console session.
    pub fn can_sign_in(&self) -> bool {
        matches!(self, Role::Admin | Role::Staff)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "driver" => Ok(Role::Driver),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
