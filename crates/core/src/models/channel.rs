//! Channel model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelId, DenId};

/// Channel kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
}

impl ChannelKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(ChannelKind::Text),
            "voice" => Some(ChannelKind::Voice),
            _ => None,
        }
    }
}

/// A text or voice channel inside a den
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    pub den_id: DenId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ChannelKind,
    pub position: u32,
    pub category: String,
    pub created_at: DateTime<Utc>,
    /// Local approximation of how many members sit in a voice channel.
    /// Always 0 for text channels.
    #[serde(default)]
    pub connected_users: u32,
}

impl Channel {
    pub fn new(den_id: DenId, name: String, kind: ChannelKind, position: u32) -> Self {
        let category = match kind {
            ChannelKind::Text => "Text Channels",
            ChannelKind::Voice => "Voice Channels",
        };
        Self {
            id: ChannelId::generate(),
            den_id,
            name: normalize_channel_name(&name, kind),
            kind,
            position,
            category: category.to_string(),
            created_at: Utc::now(),
            connected_users: 0,
        }
    }

    pub fn with_category(mut self, category: String) -> Self {
        self.category = category;
        self
    }

    pub fn is_voice(&self) -> bool {
        self.kind == ChannelKind::Voice
    }

    pub fn is_text(&self) -> bool {
        self.kind == ChannelKind::Text
    }
}

/// Text channel names are lowercase with hyphens; voice channel names are
/// kept as typed.
pub fn normalize_channel_name(name: &str, kind: ChannelKind) -> String {
    let trimmed = name.trim();
    match kind {
        ChannelKind::Voice => trimmed.to_string(),
        ChannelKind::Text => trimmed
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_names_are_hyphenated() {
        assert_eq!(
            normalize_channel_name("  Off Topic Chat ", ChannelKind::Text),
            "off-topic-chat"
        );
        assert_eq!(
            normalize_channel_name(" Lounge Room ", ChannelKind::Voice),
            "Lounge Room"
        );
    }

    #[test]
    fn kind_serializes_as_type_field() {
        let channel = Channel::new(DenId::from("d"), "general".into(), ChannelKind::Voice, 0);
        let json = serde_json::to_value(&channel).unwrap();
        assert_eq!(json["type"], "voice");
        assert_eq!(json["connectedUsers"], 0);
        assert_eq!(ChannelKind::parse("text"), Some(ChannelKind::Text));
        assert_eq!(ChannelKind::parse("video"), None);
    }
}
