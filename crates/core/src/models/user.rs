//! Local user model

use serde::{Deserialize, Serialize};

use super::UserId;

/// Presence status shown next to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Online,
    Idle,
    Dnd,
    Offline,
}

impl UserStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "online" => Some(UserStatus::Online),
            "idle" => Some(UserStatus::Idle),
            "dnd" => Some(UserStatus::Dnd),
            "offline" => Some(UserStatus::Offline),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserStatus::Online => "Online",
            UserStatus::Idle => "Idle",
            UserStatus::Dnd => "Do Not Disturb",
            UserStatus::Offline => "Offline",
        }
    }
}

/// The user running this client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    /// Four-digit discriminator
    pub tag: String,
    pub avatar: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
}

impl CurrentUser {
    /// `username#tag`
    pub fn handle(&self) -> String {
        format!("{}#{}", self.username, self.tag)
    }
}
