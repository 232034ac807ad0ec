//! Process-local store for development mode and tests.
//!
//! Implements both persistence ports over maps guarded by one async mutex,
//! so the `(group_id, email)` constraint holds under concurrent callers the
//! same way the database constraint does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use cohort_model::{GroupId, GroupInfo, GroupInvitation, NewUser, User, UserId};
use tokio::sync::Mutex;

use crate::error::{Result, StoreError};
use crate::ports::{GroupDirectory, USERS_GROUP_EMAIL_KEY, UsersRepository};

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    groups: HashMap<GroupId, GroupInfo>,
    invitations: HashMap<(GroupId, String), GroupInvitation>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    user_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_group(&self, group: GroupInfo) {
        self.state.lock().await.groups.insert(group.id, group);
    }

    pub async fn add_invitation(&self, invitation: GroupInvitation) {
        let key = (invitation.group_id, invitation.email.clone());
        self.state.lock().await.invitations.insert(key, invitation);
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    /// Number of calls made through the `UsersRepository` port so far.
    pub fn user_repository_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    fn record_user_call(&self) {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn email_taken(state: &State, group_id: GroupId, email: &str, except: Option<UserId>) -> bool {
    state
        .users
        .values()
        .any(|u| u.group_id == group_id && u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UsersRepository for InMemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User> {
        self.record_user_call();
        let mut state = self.state.lock().await;

        if email_taken(&state, user.group_id, &user.email, None) {
            return Err(StoreError::UniqueViolation {
                constraint: USERS_GROUP_EMAIL_KEY.to_string(),
            });
        }

        let now = Utc::now();
        let record = User {
            id: UserId::new(),
            group_id: user.group_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_group_and_email(&self, group_id: GroupId, email: &str) -> Result<Option<User>> {
        self.record_user_call();
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|u| u.group_id == group_id && u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        self.record_user_call();
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn update(&self, user: &User) -> Result<()> {
        self.record_user_call();
        let mut state = self.state.lock().await;

        if !state.users.contains_key(&user.id) {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }
        if email_taken(&state, user.group_id, &user.email, Some(user.id)) {
            return Err(StoreError::UniqueViolation {
                constraint: USERS_GROUP_EMAIL_KEY.to_string(),
            });
        }

        state.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl GroupDirectory for InMemoryStore {
    async fn get_group(&self, group_id: GroupId) -> Result<Option<GroupInfo>> {
        Ok(self.state.lock().await.groups.get(&group_id).cloned())
    }

    async fn get_invitation(
        &self,
        group_id: GroupId,
        email: &str,
    ) -> Result<Option<GroupInvitation>> {
        let state = self.state.lock().await;
        Ok(state
            .invitations
            .get(&(group_id, email.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_user(group_id: GroupId, email: &str) -> NewUser {
        NewUser {
            group_id,
            email: email.to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_assigns_id_and_timestamps() {
        let store = InMemoryStore::new();
        let group = GroupId(Uuid::new_v4());

        let user = store.insert(new_user(group, "grace@navy.mil")).await.unwrap();
        assert_eq!(user.created_at, user.updated_at);

        let found = store.find_by_id(user.id).await.unwrap().expect("stored");
        assert_eq!(found, user);
    }

    #[tokio::test]
    async fn duplicate_email_in_same_group_is_a_unique_violation() {
        let store = InMemoryStore::new();
        let group = GroupId(Uuid::new_v4());
        store.insert(new_user(group, "grace@navy.mil")).await.unwrap();

        let err = store
            .insert(new_user(group, "grace@navy.mil"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_of(USERS_GROUP_EMAIL_KEY));
    }

    #[tokio::test]
    async fn same_email_in_another_group_is_allowed() {
        let store = InMemoryStore::new();
        store
            .insert(new_user(GroupId(Uuid::new_v4()), "grace@navy.mil"))
            .await
            .unwrap();
        store
            .insert(new_user(GroupId(Uuid::new_v4()), "grace@navy.mil"))
            .await
            .unwrap();
        assert_eq!(store.user_count().await, 2);
    }

    #[tokio::test]
    async fn update_into_a_taken_email_is_rejected() {
        let store = InMemoryStore::new();
        let group = GroupId(Uuid::new_v4());
        store.insert(new_user(group, "a@example.com")).await.unwrap();
        let mut second = store.insert(new_user(group, "b@example.com")).await.unwrap();

        second.email = "a@example.com".to_string();
        let err = store.update(&second).await.unwrap_err();
        assert!(err.is_unique_violation_of(USERS_GROUP_EMAIL_KEY));
    }

    #[tokio::test]
    async fn update_of_unknown_user_is_not_found() {
        let store = InMemoryStore::new();
        let ghost = store
            .insert(new_user(GroupId(Uuid::new_v4()), "ghost@example.com"))
            .await
            .unwrap();
        let other = InMemoryStore::new();
        assert!(matches!(
            other.update(&ghost).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
