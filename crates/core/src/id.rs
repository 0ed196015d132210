//! Strongly-typed identifiers used across the workspace.
//!
//! The backend owns identifier allocation and hands them out either as
//! JSON strings or as integers, so every identifier is kept as its textual
//! form and accepts both encodings on the way in.

use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DomainError, DomainResult};

/// Identifier of an authenticated subject (the `id`/`sub` claim).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SubjectId(String);

/// Identifier of a driver record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DriverId(String);

/// Identifier of a staff account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StaffId(String);

/// Identifier of a penalty record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PenaltyId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawId> for String {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        }
    }
}

macro_rules! impl_record_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.pad(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> DomainResult<Self> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                if trimmed.contains('/') {
                    return Err(DomainError::invalid_id(format!(
                        "{}: '{}' contains a path separator",
                        $name, trimmed
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = RawId::deserialize(deserializer)?;
                Ok(Self(raw.into()))
            }
        }
    };
}

impl_record_newtype!(SubjectId, "SubjectId");
impl_record_newtype!(DriverId, "DriverId");
impl_record_newtype!(StaffId, "StaffId");
impl_record_newtype!(PenaltyId, "PenaltyId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_string_and_integer_encodings() {
        let from_text: DriverId = serde_json::from_str("\"d-17\"").unwrap();
        let from_int: DriverId = serde_json::from_str("17").unwrap();

        assert_eq!(from_text.as_str(), "d-17");
        assert_eq!(from_int.as_str(), "17");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = PenaltyId::new("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
    }

    #[test]
    fn parse_rejects_empty_and_path_like_values() {
        assert!("  ".parse::<StaffId>().is_err());
        assert!("a/b".parse::<StaffId>().is_err());
        assert_eq!(" 9 ".parse::<StaffId>().unwrap().as_str(), "9");
    }
}
