//! Den membership model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CurrentUser, DenId, RoleId, UserId, UserStatus};

/// A user's membership in a den
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Same as the member's user id
    pub id: UserId,
    pub den_id: DenId,
    pub username: String,
    pub tag: String,
    pub avatar: Option<String>,
    pub status: UserStatus,
    pub is_owner: bool,
    pub roles: Vec<RoleId>,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    pub fn from_user(user: &CurrentUser, den_id: DenId, is_owner: bool) -> Self {
        Self {
            id: user.id.clone(),
            den_id,
            username: user.username.clone(),
            tag: user.tag.clone(),
            avatar: user.avatar.clone(),
            status: user.status,
            is_owner,
            roles: Vec::new(),
            joined_at: Utc::now(),
        }
    }

    pub fn has_role(&self, role_id: &RoleId) -> bool {
        self.roles.iter().any(|r| r == role_id)
    }

    pub fn is_online(&self) -> bool {
        self.status != UserStatus::Offline
    }
}
