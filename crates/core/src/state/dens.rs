//! Den and channel lifecycle

use tracing::{debug, info};

use super::{Persist, StateStore, StateValue};
use crate::invariants;
use crate::models::{Channel, ChannelId, ChannelKind, Den, DenId, Member};

impl StateStore {
    /// Create a den owned by the current user, with a default text and
    /// voice channel, and switch to it. Blank names are rejected.
    pub fn create_den(&self, name: &str, description: &str) -> Option<Den> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let owner = self.current_user()?;

        let den = Den::new(name.to_string(), owner.id.clone())
            .with_description(description.trim().to_string());

        let mut dens = self.dens();
        dens.push(den.clone());

        let mut channels = self.data.borrow().channels.clone();
        channels.insert(
            den.id.clone(),
            vec![
                Channel::new(den.id.clone(), "general".to_string(), ChannelKind::Text, 0),
                Channel::new(den.id.clone(), "General".to_string(), ChannelKind::Voice, 1),
            ],
        );

        let mut members = self.data.borrow().members.clone();
        members.insert(den.id.clone(), vec![Member::from_user(&owner, den.id.clone(), true)]);

        self.update_with(
            vec![
                StateValue::Dens(dens),
                StateValue::Channels(channels),
                StateValue::Members(members),
            ],
            Persist::No,
        );
        info!(den_id = %den.id, name = %den.name, "Created den");

        self.set_active_den(&den.id);
        Some(den)
    }

    /// Delete a den together with its channels, their messages, members and
    /// roles. Leaves voice first if the session is inside the den.
    pub fn delete_den(&self, den_id: &DenId) -> bool {
        if self.find_den(den_id).is_none() {
            debug!(den_id = %den_id, "Ignoring delete of unknown den");
            return false;
        }

        let doomed = self.channels_for_den(den_id);
        if self.voice_session_in(&doomed) {
            self.leave_voice_channel();
        }

        let mut dens = self.dens();
        dens.retain(|d| &d.id != den_id);

        let (channels, messages, members, roles) = {
            let data = self.data.borrow();
            let mut channels = data.channels.clone();
            channels.remove(den_id);
            let mut messages = data.messages.clone();
            for channel in &doomed {
                messages.remove(&channel.id);
            }
            let mut members = data.members.clone();
            members.remove(den_id);
            let mut roles = data.roles.clone();
            roles.remove(den_id);
            (channels, messages, members, roles)
        };

        self.update_with(
            vec![
                StateValue::Dens(dens),
                StateValue::Channels(channels),
                StateValue::Messages(messages),
                StateValue::Members(members),
                StateValue::Roles(roles),
            ],
            Persist::No,
        );
        info!(den_id = %den_id, channels = doomed.len(), "Deleted den");

        if self.active_den_id().as_ref() == Some(den_id) {
            match self.dens().first() {
                Some(next) => self.set_active_den(&next.id),
                None => self.update(vec![
                    StateValue::ActiveDen(None),
                    StateValue::ActiveChannel(None),
                ]),
            }
        }
        true
    }

    /// Append a channel to a den. Unknown dens and blank names are ignored.
    pub fn create_channel(
        &self,
        den_id: &DenId,
        name: &str,
        kind: ChannelKind,
        category: Option<&str>,
    ) -> Option<Channel> {
        if name.trim().is_empty() || self.find_den(den_id).is_none() {
            return None;
        }

        let mut channels = self.data.borrow().channels.clone();
        let list = channels.entry(den_id.clone()).or_default();
        let position = list.iter().map(|c| c.position + 1).max().unwrap_or(0);

        let mut channel = Channel::new(den_id.clone(), name.to_string(), kind, position);
        if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
            channel = channel.with_category(category.to_string());
        }
        list.push(channel.clone());
        invariants::assert_unique_channel_ids(list);

        self.set_with(StateValue::Channels(channels), Persist::No);
        info!(den_id = %den_id, channel_id = %channel.id, "Created channel");
        Some(channel)
    }

    /// Remove a channel and its messages. An active selection or voice
    /// session pointing at it is cleared.
    pub fn delete_channel(&self, channel_id: &ChannelId) -> bool {
        let Some(channel) = self.find_channel(channel_id) else {
            return false;
        };

        if self.voice_session_in(std::slice::from_ref(&channel)) {
            self.leave_voice_channel();
        }

        let (channels, messages) = {
            let data = self.data.borrow();
            let mut channels = data.channels.clone();
            if let Some(list) = channels.get_mut(&channel.den_id) {
                list.retain(|c| &c.id != channel_id);
            }
            let mut messages = data.messages.clone();
            messages.remove(channel_id);
            (channels, messages)
        };
        self.update_with(
            vec![StateValue::Channels(channels), StateValue::Messages(messages)],
            Persist::No,
        );

        if self.active_channel_id().as_ref() == Some(channel_id) {
            let fallback = self
                .channels_for_den(&channel.den_id)
                .into_iter()
                .find(Channel::is_text)
                .map(|c| c.id);
            self.set(StateValue::ActiveChannel(fallback));
        }
        true
    }

    fn voice_session_in(&self, channels: &[Channel]) -> bool {
        self.is_connected_to_voice()
            && self
                .active_voice_channel_id()
                .is_some_and(|active| channels.iter().any(|c| c.id == active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StoreOptions;
    use crate::storage::MemoryPersistence;
    use std::rc::Rc;

    fn seeded() -> StateStore {
        let store = StateStore::new(Rc::new(MemoryPersistence::new()), StoreOptions::new());
        store.init();
        store
    }

    #[test]
    fn test_create_den_with_defaults() {
        let store = seeded();
        let den = store.create_den("  Book Club ", "weekly reads").unwrap();

        assert_eq!(den.name, "Book Club");
        assert_eq!(store.active_den_id(), Some(den.id.clone()));

        let channels = store.channels_for_den(&den.id);
        assert_eq!(channels.len(), 2);
        assert_eq!(store.active_channel_id(), Some(channels[0].id.clone()));

        let members = store.members_for_den(&den.id);
        assert_eq!(members.len(), 1);
        assert!(members[0].is_owner);

        assert!(store.create_den("   ", "").is_none());
    }

    #[test]
    fn test_delete_den_cascades() {
        let store = seeded();
        let hq = DenId::from("den-foxden");
        store.join_voice_channel(&ChannelId::from("vc-lounge"));

        assert!(store.delete_den(&hq));
        assert!(store.find_den(&hq).is_none());
        assert!(store.channels_for_den(&hq).is_empty());
        assert!(store.members_for_den(&hq).is_empty());
        assert!(store.messages_for_channel(&ChannelId::from("ch-general")).is_empty());
        assert!(!store.is_connected_to_voice());

        // Falls through to the remaining den
        assert_eq!(store.active_den_id(), Some(DenId::from("den-night-owls")));
        assert_eq!(store.active_channel_id(), Some(ChannelId::from("ch-lfg")));

        assert!(!store.delete_den(&hq));
    }

    #[test]
    fn test_delete_last_den_clears_selection() {
        let store = seeded();
        for den in store.dens() {
            store.delete_den(&den.id);
        }
        assert!(store.active_den().is_none());
        assert!(store.active_channel().is_none());
    }

    #[test]
    fn test_create_channel_positions() {
        let store = seeded();
        let hq = DenId::from("den-foxden");
        let channel = store
            .create_channel(&hq, "Memes And Stuff", ChannelKind::Text, Some("Fun"))
            .unwrap();
        assert_eq!(channel.name, "memes-and-stuff");
        assert_eq!(channel.category, "Fun");
        assert_eq!(channel.position, 5);

        assert!(store
            .create_channel(&DenId::from("nope"), "x", ChannelKind::Text, None)
            .is_none());
        assert!(store.create_channel(&hq, " ", ChannelKind::Voice, None).is_none());
    }

    #[test]
    fn test_delete_active_channel_falls_back() {
        let store = seeded();
        let general = ChannelId::from("ch-general");
        store.set_active_channel(&general);

        assert!(store.delete_channel(&general));
        assert_eq!(store.active_channel_id(), Some(ChannelId::from("ch-welcome")));
        assert!(store.messages_for_channel(&general).is_empty());
        assert!(!store.delete_channel(&general));
    }
}
