//! Read-only views over tenant groups and their invitations.

use crate::ids::{GroupId, UserId};

/// Group record as seen by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupInfo {
    pub id: GroupId,
    /// Registration requires a matching, unconsumed invitation
    pub invitation_only: bool,
}

impl GroupInfo {
    pub fn open(id: GroupId) -> Self {
        Self {
            id,
            invitation_only: false,
        }
    }

    pub fn invitation_only(id: GroupId) -> Self {
        Self {
            id,
            invitation_only: true,
        }
    }

    /// Decode the policy flags from the group's opaque properties document.
    ///
    /// Only a literal `true` under `invitation_only` enables the policy; a
    /// missing key, a non-object document, or any other value leaves the
    /// group open.
    #[cfg(feature = "serde")]
    pub fn from_properties(id: GroupId, properties: &serde_json::Value) -> Self {
        let invitation_only = properties
            .get("invitation_only")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        Self {
            id,
            invitation_only,
        }
    }
}

/// Invitation keyed by `(group_id, email)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupInvitation {
    pub group_id: GroupId,
    pub email: String,
    /// Account that consumed the invitation, if any
    pub user_id: Option<UserId>,
}

impl GroupInvitation {
    pub fn is_consumed(&self) -> bool {
        self.user_id.is_some()
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn gid() -> GroupId {
        GroupId(Uuid::new_v4())
    }

    #[test]
    fn invitation_flag_true_enables_policy() {
        let info = GroupInfo::from_properties(gid(), &json!({"invitation_only": true}));
        assert!(info.invitation_only);
    }

    #[test]
    fn missing_or_malformed_flag_leaves_group_open() {
        for properties in [
            json!({}),
            json!({"invitation_only": false}),
            json!({"invitation_only": "yes"}),
            json!([1, 2, 3]),
            json!(null),
        ] {
            let info = GroupInfo::from_properties(gid(), &properties);
            assert!(!info.invitation_only, "{properties} should decode as open");
        }
    }
}
