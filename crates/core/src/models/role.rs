//! Role model

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RoleId;
use crate::permissions::Permission;

/// Id of the default administrator role present in every den
pub const ADMIN_ROLE_ID: &str = "admin";
/// Id of the default moderator role present in every den
pub const MODERATOR_ROLE_ID: &str = "moderator";

/// A named set of permissions assignable to members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    /// Hex colour, e.g. `#e67e22`
    pub color: String,
    pub permissions: BTreeSet<Permission>,
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(name: String, color: String, permissions: BTreeSet<Permission>) -> Self {
        Self {
            id: RoleId::generate(),
            name,
            color,
            permissions,
            created_at: Utc::now(),
        }
    }

    /// The two roles every den starts with
    pub fn defaults() -> Vec<Role> {
        let now = Utc::now();
        vec![
            Role {
                id: RoleId::from(ADMIN_ROLE_ID),
                name: "Admin".to_string(),
                color: "#e74c3c".to_string(),
                permissions: Permission::all().iter().copied().collect(),
                created_at: now,
            },
            Role {
                id: RoleId::from(MODERATOR_ROLE_ID),
                name: "Moderator".to_string(),
                color: "#3498db".to_string(),
                permissions: [
                    Permission::ManageMessages,
                    Permission::KickMembers,
                    Permission::MuteMembers,
                ]
                .into_iter()
                .collect(),
                created_at: now,
            },
        ]
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.permissions.contains(&Permission::Administrator)
            || self.permissions.contains(&permission)
    }
}
