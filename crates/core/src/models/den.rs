//! Den model - a community "server" holding channels and members

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DenId, UserId};

/// A Den groups channels, members and roles under one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Den {
    pub id: DenId,
    pub name: String,
    /// Optional icon reference (URL or data URI)
    pub icon: Option<String>,
    pub owner_id: UserId,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Den {
    pub fn new(name: String, owner_id: UserId) -> Self {
        Self {
            id: DenId::generate(),
            name,
            icon: None,
            owner_id,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    /// Short label shown when a den has no icon
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}
