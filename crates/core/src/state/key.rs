//! Typed keys and values held by the state store
//!
//! Every known key has exactly one value variant, so a `StateValue` always
//! knows which key it belongs to and a mismatched set cannot be expressed.

use std::collections::HashMap;

use crate::models::{Channel, ChannelId, CurrentUser, Den, DenId, Member, Message, Role};
use crate::voice::MediaState;

use super::Theme;

pub type ChannelMap = HashMap<DenId, Vec<Channel>>;
pub type MessageMap = HashMap<ChannelId, Vec<Message>>;
pub type MemberMap = HashMap<DenId, Vec<Member>>;
pub type RoleMap = HashMap<DenId, Vec<Role>>;

/// Addressable slot in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    CurrentUser,
    ActiveDen,
    ActiveChannel,
    ActiveVoiceChannel,
    ConnectedToVoice,
    MicMuted,
    Deafened,
    VideoEnabled,
    ScreenShareEnabled,
    Dens,
    Channels,
    Messages,
    /// The message list of one channel (`messages:{channelId}`)
    ChannelMessages(ChannelId),
    Members,
    Roles,
    CurrentTheme,
    MembersSidebarVisible,
    /// Free-form setting outside the typed keys
    Setting(String),
}

impl StateKey {
    pub fn name(&self) -> String {
        match self {
            StateKey::CurrentUser => "currentUser".to_string(),
            StateKey::ActiveDen => "activeDen".to_string(),
            StateKey::ActiveChannel => "activeChannel".to_string(),
            StateKey::ActiveVoiceChannel => "activeVoiceChannel".to_string(),
            StateKey::ConnectedToVoice => "connectedToVoice".to_string(),
            StateKey::MicMuted => "micMuted".to_string(),
            StateKey::Deafened => "deafened".to_string(),
            StateKey::VideoEnabled => "videoEnabled".to_string(),
            StateKey::ScreenShareEnabled => "screenShareEnabled".to_string(),
            StateKey::Dens => "dens".to_string(),
            StateKey::Channels => "channels".to_string(),
            StateKey::Messages => "messages".to_string(),
            StateKey::ChannelMessages(id) => format!("messages:{id}"),
            StateKey::Members => "members".to_string(),
            StateKey::Roles => "roles".to_string(),
            StateKey::CurrentTheme => "currentTheme".to_string(),
            StateKey::MembersSidebarVisible => "membersSidebarVisible".to_string(),
            StateKey::Setting(name) => name.clone(),
        }
    }
}

impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

/// What a subscriber listens to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Key(StateKey),
    /// Every key touched by any set/update
    All,
}

impl From<StateKey> for Topic {
    fn from(key: StateKey) -> Self {
        Topic::Key(key)
    }
}

/// A value together with the key it is stored under
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    CurrentUser(Option<CurrentUser>),
    ActiveDen(Option<DenId>),
    ActiveChannel(Option<ChannelId>),
    ActiveVoiceChannel(Option<ChannelId>),
    ConnectedToVoice(bool),
    MicMuted(bool),
    Deafened(bool),
    VideoEnabled(MediaState),
    ScreenShareEnabled(MediaState),
    Dens(Vec<Den>),
    Channels(ChannelMap),
    Messages(MessageMap),
    ChannelMessages(ChannelId, Vec<Message>),
    Members(MemberMap),
    Roles(RoleMap),
    CurrentTheme(Theme),
    MembersSidebarVisible(bool),
    /// `None` removes the setting
    Setting(String, Option<serde_json::Value>),
}

impl StateValue {
    pub fn key(&self) -> StateKey {
        match self {
            StateValue::CurrentUser(_) => StateKey::CurrentUser,
            StateValue::ActiveDen(_) => StateKey::ActiveDen,
            StateValue::ActiveChannel(_) => StateKey::ActiveChannel,
            StateValue::ActiveVoiceChannel(_) => StateKey::ActiveVoiceChannel,
            StateValue::ConnectedToVoice(_) => StateKey::ConnectedToVoice,
            StateValue::MicMuted(_) => StateKey::MicMuted,
            StateValue::Deafened(_) => StateKey::Deafened,
            StateValue::VideoEnabled(_) => StateKey::VideoEnabled,
            StateValue::ScreenShareEnabled(_) => StateKey::ScreenShareEnabled,
            StateValue::Dens(_) => StateKey::Dens,
            StateValue::Channels(_) => StateKey::Channels,
            StateValue::Messages(_) => StateKey::Messages,
            StateValue::ChannelMessages(id, _) => StateKey::ChannelMessages(id.clone()),
            StateValue::Members(_) => StateKey::Members,
            StateValue::Roles(_) => StateKey::Roles,
            StateValue::CurrentTheme(_) => StateKey::CurrentTheme,
            StateValue::MembersSidebarVisible(_) => StateKey::MembersSidebarVisible,
            StateValue::Setting(name, _) => StateKey::Setting(name.clone()),
        }
    }

    /// Boolean payload of flag keys
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::ConnectedToVoice(b)
            | StateValue::MicMuted(b)
            | StateValue::Deafened(b)
            | StateValue::MembersSidebarVisible(b) => Some(*b),
            _ => None,
        }
    }

    /// Channel id payload of the channel pointer keys
    pub fn as_channel_id(&self) -> Option<&ChannelId> {
        match self {
            StateValue::ActiveChannel(id) | StateValue::ActiveVoiceChannel(id) => id.as_ref(),
            _ => None,
        }
    }

    pub fn as_media_state(&self) -> Option<MediaState> {
        match self {
            StateValue::VideoEnabled(s) | StateValue::ScreenShareEnabled(s) => Some(*s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_messages_key_is_scoped() {
        let key = StateKey::ChannelMessages(ChannelId::from("ch-general"));
        assert_eq!(key.name(), "messages:ch-general");
        assert_eq!(StateKey::ActiveVoiceChannel.to_string(), "activeVoiceChannel");
    }

    #[test]
    fn value_knows_its_key() {
        let value = StateValue::ChannelMessages(ChannelId::from("c1"), Vec::new());
        assert_eq!(value.key(), StateKey::ChannelMessages(ChannelId::from("c1")));
        assert_eq!(StateValue::MicMuted(true).as_bool(), Some(true));
        assert_eq!(StateValue::Dens(Vec::new()).as_bool(), None);
    }
}
