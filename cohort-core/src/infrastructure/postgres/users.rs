use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cohort_model::{GroupId, NewUser, User, UserId};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::map_sqlx_error;
use crate::{
    error::{Result, StoreError},
    ports::UsersRepository,
};

const USER_COLUMNS: &str =
    "id, group_id, email, first_name, last_name, password_hash, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    group_id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            group_id: GroupId(row.group_id),
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed implementation of the `UsersRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn insert(&self, user: NewUser) -> Result<User> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to start transaction"))?;

        let sql = format!(
            r#"
            INSERT INTO users (group_id, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.group_id.to_uuid())
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to create user"))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to commit transaction"))?;

        info!("Created user {} in group {}", row.id, row.group_id);
        Ok(row.into())
    }

    async fn find_by_group_and_email(&self, group_id: GroupId, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE group_id = $1 AND email = $2");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(group_id.to_uuid())
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to get user by email"))?;

        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.to_uuid())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to get user by id"))?;

        Ok(row.map(User::from))
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to start transaction"))?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4,
                password_hash = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(user.id.to_uuid())
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(e, "Failed to update user"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("user {}", user.id)));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error(e, "Failed to commit transaction"))?;

        debug!("Updated user {}", user.id);
        Ok(())
    }
}
