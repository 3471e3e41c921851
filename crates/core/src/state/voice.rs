//! Voice channel membership bookkeeping

use tracing::{debug, info};

use super::{Persist, StateStore, StateValue};
use crate::invariants;
use crate::models::{ChannelId, Member};
use crate::voice::MediaState;

impl StateStore {
    /// Enter a voice channel: mark it active, reset every media flag and
    /// bump its connected-user counter. Unknown or text channels are ignored.
    pub fn join_voice_channel(&self, channel_id: &ChannelId) {
        let Some(channel) = self.find_channel(channel_id) else {
            debug!(channel_id = %channel_id, "Ignoring join of unknown channel");
            return;
        };
        if !channel.is_voice() {
            debug!(channel_id = %channel_id, "Ignoring join of text channel");
            return;
        }

        self.update_with(
            vec![
                StateValue::ActiveVoiceChannel(Some(channel_id.clone())),
                StateValue::ConnectedToVoice(true),
                StateValue::MicMuted(false),
                StateValue::Deafened(false),
                StateValue::VideoEnabled(MediaState::Off),
                StateValue::ScreenShareEnabled(MediaState::Off),
            ],
            Persist::No,
        );
        self.adjust_connected_users(channel_id, 1);
        info!(channel_id = %channel_id, "Joined voice channel");

        invariants::assert_voice_session_invariants(
            self.is_connected_to_voice(),
            self.active_voice_channel_id().as_ref(),
        );
    }

    /// Leave the current voice channel, if any
    pub fn leave_voice_channel(&self) {
        if !self.is_connected_to_voice() {
            debug!("Not connected to voice");
            return;
        }

        if let Some(previous) = self.active_voice_channel_id() {
            self.adjust_connected_users(&previous, -1);
            info!(channel_id = %previous, "Left voice channel");
        }

        self.update_with(
            vec![
                StateValue::ActiveVoiceChannel(None),
                StateValue::ConnectedToVoice(false),
                StateValue::MicMuted(false),
                StateValue::Deafened(false),
                StateValue::VideoEnabled(MediaState::Off),
                StateValue::ScreenShareEnabled(MediaState::Off),
            ],
            Persist::No,
        );

        invariants::assert_voice_session_invariants(
            self.is_connected_to_voice(),
            self.active_voice_channel_id().as_ref(),
        );
    }

    /// Who appears inside a voice channel: the local user when connected
    /// there, padded with other den members up to the channel's counter
    pub fn voice_channel_participants(&self, channel_id: &ChannelId) -> Vec<Member> {
        let Some(channel) = self.find_channel(channel_id).filter(|c| c.is_voice()) else {
            return Vec::new();
        };

        let members = self.members_for_den(&channel.den_id);
        let me = self.current_user().map(|u| u.id);
        let mut count = channel.connected_users as usize;
        let mut participants = Vec::new();

        let here = self.is_connected_to_voice()
            && self.active_voice_channel_id().as_ref() == Some(channel_id);
        if here {
            if let Some(local) = members.iter().find(|m| Some(&m.id) == me.as_ref()) {
                participants.push(local.clone());
                count = count.saturating_sub(1);
            }
        }

        participants.extend(
            members
                .into_iter()
                .filter(|m| Some(&m.id) != me.as_ref())
                .take(count),
        );
        participants
    }

    /// Copy-on-write change of a voice channel's counter, floored at 0
    fn adjust_connected_users(&self, channel_id: &ChannelId, delta: i64) {
        let Some(channel) = self.find_channel(channel_id) else {
            return;
        };

        let mut channels = self.data.borrow().channels.clone();
        let Some(target) = channels
            .get_mut(&channel.den_id)
            .and_then(|list| list.iter_mut().find(|c| &c.id == channel_id))
        else {
            return;
        };

        let next = (i64::from(target.connected_users) + delta).max(0);
        target.connected_users = u32::try_from(next).unwrap_or(u32::MAX);
        self.set_with(StateValue::Channels(channels), Persist::No);
    }
}

#[cfg(test)]
mod tests {
    use crate::models::ChannelId;
    use crate::state::{StateKey, StateStore, StateValue, StoreOptions};
    use crate::storage::MemoryPersistence;
    use std::cell::Cell;
    use std::rc::Rc;

    fn seeded() -> StateStore {
        let store = StateStore::new(Rc::new(MemoryPersistence::new()), StoreOptions::new());
        store.init();
        store
    }

    fn connected_users(store: &StateStore, id: &str) -> u32 {
        store.find_channel(&ChannelId::from(id)).unwrap().connected_users
    }

    #[test]
    fn test_join_leave_restores_counter() {
        let store = seeded();
        let lounge = ChannelId::from("vc-lounge");
        let before = connected_users(&store, "vc-lounge");

        store.join_voice_channel(&lounge);
        assert_eq!(connected_users(&store, "vc-lounge"), before + 1);
        assert!(store.is_connected_to_voice());

        store.leave_voice_channel();
        assert_eq!(connected_users(&store, "vc-lounge"), before);
        assert!(!store.is_connected_to_voice());
        assert!(store.active_voice_channel_id().is_none());
    }

    #[test]
    fn test_join_resets_flags_and_notifies_channels() {
        let store = seeded();
        store.set_with(StateValue::MicMuted(true), crate::state::Persist::No);
        store.set_with(StateValue::Deafened(true), crate::state::Persist::No);

        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        store.subscribe(StateKey::Channels, move |_, _| h.set(h.get() + 1));

        store.join_voice_channel(&ChannelId::from("vc-meeting"));
        assert!(!store.mic_muted());
        assert!(!store.deafened());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_join_text_channel_is_noop() {
        let store = seeded();
        store.join_voice_channel(&ChannelId::from("ch-general"));
        assert!(!store.is_connected_to_voice());
        store.join_voice_channel(&ChannelId::from("vc-missing"));
        assert!(!store.is_connected_to_voice());
    }

    #[test]
    fn test_leave_when_disconnected_is_noop() {
        let store = seeded();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        store.subscribe(crate::state::Topic::All, move |_, _| h.set(h.get() + 1));

        store.leave_voice_channel();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_counter_floor_after_lightweight_selection() {
        let store = seeded();
        // Clicking a voice channel connects without incrementing
        store.set_active_channel(&ChannelId::from("vc-lounge"));
        store.leave_voice_channel();
        assert_eq!(connected_users(&store, "vc-lounge"), 0);
    }

    #[test]
    fn test_participants_include_local_user_first() {
        let store = seeded();
        let lounge = ChannelId::from("vc-lounge");
        assert!(store.voice_channel_participants(&lounge).is_empty());

        store.join_voice_channel(&lounge);
        let participants = store.voice_channel_participants(&lounge);
        assert_eq!(participants.len(), 1);
        assert_eq!(Some(participants[0].id.clone()), store.current_user().map(|u| u.id));
        assert!(store
            .voice_channel_participants(&ChannelId::from("ch-general"))
            .is_empty());
    }
}
