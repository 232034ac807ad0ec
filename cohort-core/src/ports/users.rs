use async_trait::async_trait;
use cohort_model::{GroupId, NewUser, User, UserId};

use crate::error::Result;

/// Name of the `(group_id, email)` uniqueness constraint. Adapters report
/// collisions as `StoreError::UniqueViolation` carrying this name.
pub const USERS_GROUP_EMAIL_KEY: &str = "users_group_id_email_key";

// User record store
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Insert a new record; the store assigns `id` and timestamps.
    async fn insert(&self, user: NewUser) -> Result<User>;
    async fn find_by_group_and_email(&self, group_id: GroupId, email: &str) -> Result<Option<User>>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    /// Persist every mutable field of `user`.
    async fn update(&self, user: &User) -> Result<()>;
}
