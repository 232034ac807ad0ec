//! Core data model definitions shared across Cohort crates.
#![allow(missing_docs)]

pub mod error;
pub mod error_field;
pub mod group;
pub mod ids;
pub mod user;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use error_field::{ErrorField, codes, fields};
pub use group::{GroupInfo, GroupInvitation};
pub use ids::{GroupId, UserId};
pub use user::{NewUser, User, UserChanges, UserProfile};
