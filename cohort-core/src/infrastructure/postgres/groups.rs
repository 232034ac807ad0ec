use async_trait::async_trait;
use cohort_model::{GroupId, GroupInfo, GroupInvitation, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx_error;
use crate::{error::Result, ports::GroupDirectory};

/// Reads the tenant tables owned by the group-management service.
#[derive(Clone, Debug)]
pub struct PostgresGroupDirectory {
    pool: PgPool,
}

impl PostgresGroupDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl GroupDirectory for PostgresGroupDirectory {
    async fn get_group(&self, group_id: GroupId) -> Result<Option<GroupInfo>> {
        let properties: Option<(Option<serde_json::Value>,)> =
            sqlx::query_as("SELECT properties FROM groups WHERE id = $1")
                .bind(group_id.to_uuid())
                .fetch_optional(self.pool())
                .await
                .map_err(|e| map_sqlx_error(e, "Failed to get group"))?;

        Ok(properties.map(|(properties,)| {
            GroupInfo::from_properties(group_id, &properties.unwrap_or_default())
        }))
    }

    async fn get_invitation(
        &self,
        group_id: GroupId,
        email: &str,
    ) -> Result<Option<GroupInvitation>> {
        let row: Option<(Option<Uuid>,)> =
            sqlx::query_as("SELECT user_id FROM group_users WHERE group_id = $1 AND email = $2")
                .bind(group_id.to_uuid())
                .bind(email)
                .fetch_optional(self.pool())
                .await
                .map_err(|e| map_sqlx_error(e, "Failed to get group invitation"))?;

        Ok(row.map(|(user_id,)| GroupInvitation {
            group_id,
            email: email.to_string(),
            user_id: user_id.map(UserId),
        }))
    }
}
