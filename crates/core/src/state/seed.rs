//! Example dens shown on first launch
//!
//! Fixture data is fixed: ids and timestamps never change between runs, so a
//! persisted selection keeps pointing at the same den and channel.

use chrono::{DateTime, Utc};

use super::key::{ChannelMap, MemberMap, MessageMap};
use crate::models::{
    Channel, ChannelId, ChannelKind, CurrentUser, Den, DenId, Member, Message, MessageId, RoleId,
    UserId, UserStatus, ADMIN_ROLE_ID, MODERATOR_ROLE_ID,
};

pub(crate) const LOCAL_USER_ID: &str = "user-local";

/// 2024-03-01T12:00:00Z
const SEED_EPOCH: i64 = 1_709_294_400;

pub(crate) struct Fixtures {
    pub dens: Vec<Den>,
    pub channels: ChannelMap,
    pub members: MemberMap,
    pub messages: MessageMap,
}

fn at(offset_minutes: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(SEED_EPOCH + offset_minutes * 60, 0).unwrap_or_default()
}

/// The user a fresh install runs as
pub(crate) fn local_user() -> CurrentUser {
    CurrentUser {
        id: UserId::from(LOCAL_USER_ID),
        username: "You".to_string(),
        tag: "0001".to_string(),
        avatar: None,
        status: UserStatus::Online,
    }
}

fn den(id: &str, name: &str, description: &str) -> Den {
    Den {
        id: DenId::from(id),
        name: name.to_string(),
        icon: None,
        owner_id: UserId::from(LOCAL_USER_ID),
        description: description.to_string(),
        created_at: at(0),
    }
}

fn channel(
    den_id: &str,
    id: &str,
    name: &str,
    kind: ChannelKind,
    position: u32,
    category: &str,
) -> Channel {
    Channel {
        id: ChannelId::from(id),
        den_id: DenId::from(den_id),
        name: name.to_string(),
        kind,
        position,
        category: category.to_string(),
        created_at: at(0),
        connected_users: 0,
    }
}

fn member(den_id: &str, id: &str, username: &str, tag: &str, status: UserStatus, roles: &[&str]) -> Member {
    Member {
        id: UserId::from(id),
        den_id: DenId::from(den_id),
        username: username.to_string(),
        tag: tag.to_string(),
        avatar: None,
        status,
        is_owner: id == LOCAL_USER_ID,
        roles: roles.iter().map(|r| RoleId::from(*r)).collect(),
        joined_at: at(1),
    }
}

fn message(channel_id: &str, n: u32, user: (&str, &str), content: &str, minute: i64) -> Message {
    Message {
        id: MessageId::new(format!("msg-{channel_id}-{n}")),
        channel_id: ChannelId::from(channel_id),
        user_id: UserId::from(user.0),
        username: user.1.to_string(),
        avatar: None,
        content: content.to_string(),
        timestamp: at(minute),
        edited: false,
        attachment: None,
        reactions: Default::default(),
    }
}

pub(crate) fn fixtures() -> Fixtures {
    use ChannelKind::{Text, Voice};

    let hq = "den-foxden";
    let owls = "den-night-owls";

    let dens = vec![
        den(hq, "Foxden HQ", "Home base for the Foxden community"),
        den(owls, "Night Owls", "Late-night gaming and hangouts"),
    ];

    let mut channels = ChannelMap::new();
    channels.insert(
        DenId::from(hq),
        vec![
            channel(hq, "ch-welcome", "welcome", Text, 0, "Information"),
            channel(hq, "ch-general", "general", Text, 1, "Text Channels"),
            channel(hq, "ch-dev", "development", Text, 2, "Text Channels"),
            channel(hq, "vc-lounge", "Lounge", Voice, 3, "Voice Channels"),
            channel(hq, "vc-meeting", "Meeting Room", Voice, 4, "Voice Channels"),
        ],
    );
    channels.insert(
        DenId::from(owls),
        vec![
            channel(owls, "ch-lfg", "looking-for-group", Text, 0, "Text Channels"),
            channel(owls, "ch-clips", "clips", Text, 1, "Text Channels"),
            channel(owls, "vc-squad", "Squad", Voice, 2, "Voice Channels"),
        ],
    );

    let mut members = MemberMap::new();
    members.insert(
        DenId::from(hq),
        vec![
            member(hq, LOCAL_USER_ID, "You", "0001", UserStatus::Online, &[]),
            member(hq, "user-fennec", "Fennec", "4521", UserStatus::Online, &[ADMIN_ROLE_ID]),
            member(hq, "user-kit", "Kit", "1187", UserStatus::Idle, &[MODERATOR_ROLE_ID]),
            member(hq, "user-ember", "Ember", "9034", UserStatus::Dnd, &[]),
            member(hq, "user-sly", "Sly", "3302", UserStatus::Offline, &[]),
        ],
    );
    members.insert(
        DenId::from(owls),
        vec![
            member(owls, LOCAL_USER_ID, "You", "0001", UserStatus::Online, &[]),
            member(owls, "user-kit", "Kit", "1187", UserStatus::Idle, &[]),
            member(owls, "user-rusty", "Rusty", "7710", UserStatus::Online, &[]),
        ],
    );

    let fennec = ("user-fennec", "Fennec");
    let kit = ("user-kit", "Kit");
    let rusty = ("user-rusty", "Rusty");

    let mut messages = MessageMap::new();
    messages.insert(
        ChannelId::from("ch-welcome"),
        vec![message(
            "ch-welcome",
            1,
            fennec,
            "Welcome to Foxden HQ! Read the pinned notes and say hi in #general.",
            5,
        )],
    );
    messages.insert(
        ChannelId::from("ch-general"),
        vec![
            message("ch-general", 1, kit, "Morning everyone", 30),
            message("ch-general", 2, fennec, "Hey Kit! Voice meeting at noon in the Meeting Room.", 32),
        ],
    );
    messages.insert(
        ChannelId::from("ch-lfg"),
        vec![message("ch-lfg", 1, rusty, "Anyone up for a late run tonight?", 60)],
    );

    Fixtures {
        dens,
        channels,
        members,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_den_has_a_text_channel_and_an_owner_member() {
        let f = fixtures();
        for den in &f.dens {
            let channels = &f.channels[&den.id];
            assert!(channels.iter().any(Channel::is_text), "{} has no text channel", den.id);
            assert!(f.members[&den.id].iter().any(|m| m.is_owner && m.id == den.owner_id));
        }
    }

    #[test]
    fn fixtures_are_stable() {
        let a = fixtures();
        let b = fixtures();
        assert_eq!(a.dens, b.dens);
        assert_eq!(a.messages, b.messages);
    }
}
