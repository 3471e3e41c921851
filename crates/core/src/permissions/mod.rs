//! Permission system for den operations

use serde::{Deserialize, Serialize};

use crate::models::{Member, Role};

/// Actions a role can grant inside a den
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Grants every other permission
    Administrator,

    // Den management
    ManageDen,
    ManageChannels,
    ManageRoles,

    // Member management
    KickMembers,
    BanMembers,
    MuteMembers,

    // Chat
    SendMessages,
    ManageMessages,
    AttachFiles,

    // Voice
    Connect,
    Speak,
    Video,
}

impl Permission {
    pub fn all() -> &'static [Permission] {
        &[
            Permission::Administrator,
            Permission::ManageDen,
            Permission::ManageChannels,
            Permission::ManageRoles,
            Permission::KickMembers,
            Permission::BanMembers,
            Permission::MuteMembers,
            Permission::SendMessages,
            Permission::ManageMessages,
            Permission::AttachFiles,
            Permission::Connect,
            Permission::Speak,
            Permission::Video,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Permission::Administrator => "Administrator",
            Permission::ManageDen => "Manage Den",
            Permission::ManageChannels => "Manage Channels",
            Permission::ManageRoles => "Manage Roles",
            Permission::KickMembers => "Kick Members",
            Permission::BanMembers => "Ban Members",
            Permission::MuteMembers => "Mute Members",
            Permission::SendMessages => "Send Messages",
            Permission::ManageMessages => "Manage Messages",
            Permission::AttachFiles => "Attach Files",
            Permission::Connect => "Connect",
            Permission::Speak => "Speak",
            Permission::Video => "Video",
        }
    }

    /// Granted to every member regardless of roles
    pub fn is_baseline(&self) -> bool {
        matches!(
            self,
            Permission::SendMessages
                | Permission::AttachFiles
                | Permission::Connect
                | Permission::Speak
                | Permission::Video
        )
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Resolves a member's effective permissions against a den's roles
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Check if a member may perform an action guarded by `permission`
    pub fn can_perform(member: &Member, den_roles: &[Role], permission: Permission) -> bool {
        // Den owner - full control
        if member.is_owner {
            return true;
        }

        if permission.is_baseline() {
            return true;
        }

        den_roles
            .iter()
            .filter(|role| member.has_role(&role.id))
            .any(|role| role.grants(permission))
    }

    /// Every permission the member effectively holds
    pub fn effective(member: &Member, den_roles: &[Role]) -> Vec<Permission> {
        Permission::all()
            .iter()
            .copied()
            .filter(|p| Self::can_perform(member, den_roles, *p))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DenId, RoleId, UserId, UserStatus, ADMIN_ROLE_ID, MODERATOR_ROLE_ID};
    use chrono::Utc;

    fn member(id: &str, is_owner: bool, roles: &[&str]) -> Member {
        Member {
            id: UserId::from(id),
            den_id: DenId::from("den"),
            username: id.to_string(),
            tag: "0000".to_string(),
            avatar: None,
            status: UserStatus::Online,
            is_owner,
            roles: roles.iter().map(|r| RoleId::from(*r)).collect(),
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_permissions() {
        let owner = member("owner", true, &[]);
        assert!(PermissionMatrix::can_perform(&owner, &[], Permission::ManageRoles));
        assert!(PermissionMatrix::can_perform(&owner, &[], Permission::ManageDen));
    }

    #[test]
    fn test_plain_members_denied() {
        let roles = Role::defaults();
        let a = member("a", false, &[]);
        let b = member("b", false, &[]);
        assert!(!PermissionMatrix::can_perform(&a, &roles, Permission::ManageRoles));
        assert!(!PermissionMatrix::can_perform(&b, &roles, Permission::ManageRoles));
        assert!(PermissionMatrix::can_perform(&a, &roles, Permission::SendMessages));
    }

    #[test]
    fn test_admin_role_grants_everything() {
        let roles = Role::defaults();
        let admin = member("a", false, &[ADMIN_ROLE_ID]);
        assert!(PermissionMatrix::can_perform(&admin, &roles, Permission::ManageRoles));
        assert_eq!(
            PermissionMatrix::effective(&admin, &roles).len(),
            Permission::all().len()
        );
    }

    #[test]
    fn test_moderator_role() {
        let roles = Role::defaults();
        let moderator = member("m", false, &[MODERATOR_ROLE_ID]);
        assert!(PermissionMatrix::can_perform(&moderator, &roles, Permission::KickMembers));
        assert!(!PermissionMatrix::can_perform(&moderator, &roles, Permission::BanMembers));
        assert!(!PermissionMatrix::can_perform(&moderator, &roles, Permission::ManageRoles));
    }

    #[test]
    fn test_unknown_role_id_grants_nothing() {
        let roles = Role::defaults();
        let m = member("m", false, &["ghost"]);
        assert!(!PermissionMatrix::can_perform(&m, &roles, Permission::KickMembers));
    }
}
