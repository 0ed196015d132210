//! `fleetadmin-auth`: session model and access policy.
//!
//! Nothing here touches HTTP or storage: the crate decodes
//! token claims into a [`Session`] and decides whether a session may enter a
//! view. Fetching and persisting credentials is the client's job.

pub mod claims;
pub mod guard;
pub mod permissions;
pub mod roles;
pub mod session;

pub use claims::{ClaimsError, TokenClaims, decode_claims, session_from_token};
pub use guard::{AccessDecision, AccessRequirement, GuardOutcome, decide, evaluate, permits};
pub use permissions::{Permission, PermissionCatalog};
pub use roles::{Role, UnknownRole};
pub use session::{Session, SessionState};
