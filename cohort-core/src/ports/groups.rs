use async_trait::async_trait;
use cohort_model::{GroupId, GroupInfo, GroupInvitation};

use crate::error::Result;

/// Read contract over the tenant-management service's groups and invitations.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn get_group(&self, group_id: GroupId) -> Result<Option<GroupInfo>>;
    async fn get_invitation(
        &self,
        group_id: GroupId,
        email: &str,
    ) -> Result<Option<GroupInvitation>>;
}
