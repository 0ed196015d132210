//! `fleetadmin-core`: shared building blocks.
//!
//! Identifiers and the validation error model used by every other crate.
//! Nothing here talks to the network or touches storage.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{DriverId, PenaltyId, StaffId, SubjectId};
