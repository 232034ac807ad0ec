//! # Cohort Core
//!
//! Business logic for the Cohort identity service: user accounts scoped to
//! tenant groups, per-group enrollment policy, password credentials, and
//! stateless session tokens.
//!
//! ## Overview
//!
//! - **Credentials**: Argon2id hashing with an optional server-side pepper
//! - **Sessions**: HS256 bearer tokens with a fixed lifetime and no revocation
//! - **Enrollment policy**: open groups and invitation-only groups
//! - **Identity workflow**: Register, Login, Get, and Update with a structured
//!   failure envelope
//! - **Persistence**: repository ports with PostgreSQL and in-memory adapters
//!
//! ## Feature Flags
//!
//! - `database`: Enables the PostgreSQL adapters and embedded migrations
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cohort_core::{
//!     crypto::CredentialCodec,
//!     identity::{IdentityService, RegisterRequest},
//!     infrastructure::InMemoryStore,
//!     token::TokenService,
//! };
//!
//! async fn register() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let service = IdentityService::new(
//!         store.clone(),
//!         store,
//!         Arc::new(CredentialCodec::new("pepper")?),
//!         Arc::new(TokenService::new("signing-secret")?),
//!     );
//!
//!     let profile = service
//!         .register(RegisterRequest {
//!             group_id: "0190f5b8-52a1-7d6e-9a51-4f3c2b1a0e9d".into(),
//!             email: "alice@example.com".into(),
//!             password: "correct horse battery".into(),
//!             first_name: "Alice".into(),
//!             last_name: "Liddell".into(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("registered {}", profile.id);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Password hashing and verification
pub mod crypto;

/// Storage failures shared by every adapter
pub mod error;

/// Register, Login, Get, and Update
pub mod identity;

/// Port implementations (PostgreSQL, in-memory)
pub mod infrastructure;

/// Group enrollment policy
pub mod policy;

/// Repository traits consumed by the identity workflow
pub mod ports;

/// Session token issuance and verification
pub mod token;

/// Request field validation
pub mod validation;

#[cfg(feature = "database")]
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub use cohort_model as model;
pub use error::{Result, StoreError};
pub use identity::{Code, IdentityError, IdentityService, Status};
