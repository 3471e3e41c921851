//! Message model for channel chat

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelId, CurrentUser, MessageId, UserId};

/// File attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    pub url: String,
    pub size_bytes: u64,
    pub mime_type: Option<String>,
}

/// A chat message in a channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub username: String,
    pub avatar: Option<String>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub edited: bool,
    pub attachment: Option<Attachment>,
    /// Emoji -> users who reacted with it
    #[serde(default)]
    pub reactions: BTreeMap<String, Vec<UserId>>,
}

impl Message {
    pub fn new(channel_id: ChannelId, author: &CurrentUser, content: String) -> Self {
        Self {
            id: MessageId::generate(),
            channel_id,
            user_id: author.id.clone(),
            username: author.username.clone(),
            avatar: author.avatar.clone(),
            content,
            timestamp: Utc::now(),
            edited: false,
            attachment: None,
            reactions: BTreeMap::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    /// Add `user_id` to the emoji's reaction list, or remove them if they
    /// already reacted. Emoji entries with no users left are dropped.
    pub fn toggle_reaction(&mut self, emoji: &str, user_id: &UserId) {
        let users = self.reactions.entry(emoji.to_string()).or_default();
        if let Some(pos) = users.iter().position(|u| u == user_id) {
            users.remove(pos);
        } else {
            users.push(user_id.clone());
        }
        if users.is_empty() {
            self.reactions.remove(emoji);
        }
    }

    pub fn reaction_count(&self, emoji: &str) -> usize {
        self.reactions.get(emoji).map_or(0, Vec::len)
    }

    pub fn format_timestamp(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}
