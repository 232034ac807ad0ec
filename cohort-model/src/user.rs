//! User account records.
//!
//! A [`User`] is the stored identity record including its password digest.
//! Anything leaving the service boundary goes through [`UserProfile`], which
//! has no way to carry the digest at all.

use chrono::{DateTime, Utc};

use crate::ids::{GroupId, UserId};

/// Stored identity record.
///
/// `(group_id, email)` is unique across all records. `id`, `group_id`, and
/// `created_at` never change after insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Identifier assigned by the store on insertion
    pub id: UserId,
    /// Tenant this account belongs to
    pub group_id: GroupId,
    /// Email address, unique within the group
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2id PHC string; never the plaintext
    pub password_hash: String,
    /// Set once, on creation
    pub created_at: DateTime<Utc>,
    /// Advanced on every mutation
    pub updated_at: DateTime<Utc>,
}

/// Insert payload. The store fills in `id` and both timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub group_id: GroupId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Partial update applied to an existing [`User`].
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
}

impl User {
    /// Apply the supplied fields and stamp `updated_at`.
    pub fn apply(&mut self, changes: UserChanges, now: DateTime<Utc>) {
        let UserChanges {
            email,
            first_name,
            last_name,
            password_hash,
        } = changes;

        if let Some(email) = email {
            self.email = email;
        }
        if let Some(first_name) = first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = last_name {
            self.last_name = last_name;
        }
        if let Some(password_hash) = password_hash {
            self.password_hash = password_hash;
        }

        // Never move backwards, even if the caller's clock lags the store's.
        self.updated_at = now.max(self.updated_at);
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// Public view of a [`User`], returned by Register, Get, and Update.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserProfile {
    pub id: UserId,
    pub group_id: GroupId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            group_id: user.group_id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            group_id: user.group_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
