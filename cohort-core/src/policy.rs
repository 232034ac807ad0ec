//! Per-group enrollment policy.

use std::{any::type_name_of_val, fmt, sync::Arc};

use cohort_model::GroupId;
use thiserror::Error;

use crate::{error::StoreError, ports::GroupDirectory};

/// Why a registration may not proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    #[error("group {0} is not found")]
    GroupNotFound(GroupId),

    #[error("this group is for invitation only")]
    InvitationRequired,

    #[error("invitation for {email} has already been used")]
    InvitationConsumed { email: String },

    #[error("group directory unavailable: {0}")]
    Directory(#[from] StoreError),
}

/// Decides whether an email may register into a group.
///
/// Checks run in order and the first failure wins: the group must exist, and
/// an invitation-only group additionally requires an unconsumed invitation
/// for the exact email.
pub struct GroupPolicyGate<D>
where
    D: GroupDirectory + ?Sized,
{
    directory: Arc<D>,
}

impl<D> Clone for GroupPolicyGate<D>
where
    D: GroupDirectory + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
        }
    }
}

impl<D> fmt::Debug for GroupPolicyGate<D>
where
    D: GroupDirectory + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupPolicyGate")
            .field("directory", &type_name_of_val(self.directory.as_ref()))
            .finish()
    }
}

impl<D> GroupPolicyGate<D>
where
    D: GroupDirectory + ?Sized,
{
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    pub async fn check_registration(
        &self,
        group_id: GroupId,
        email: &str,
    ) -> Result<(), PolicyRejection> {
        let group = self
            .directory
            .get_group(group_id)
            .await?
            .ok_or(PolicyRejection::GroupNotFound(group_id))?;

        if !group.invitation_only {
            return Ok(());
        }

        match self.directory.get_invitation(group_id, email).await? {
            None => Err(PolicyRejection::InvitationRequired),
            Some(invitation) if invitation.is_consumed() => {
                Err(PolicyRejection::InvitationConsumed {
                    email: email.to_string(),
                })
            }
            Some(_) => Ok(()),
        }
    }
}
