//! Den and channel selection

use tracing::debug;

use super::{Persist, StateStore, StateValue};
use crate::invariants;
use crate::models::{ChannelId, DenId};

impl StateStore {
    /// Select a den. Unknown dens are ignored.
    ///
    /// If the current channel already belongs to this den it is kept;
    /// otherwise the den's first text channel (list order) becomes active,
    /// or no channel at all when the den has no text channel.
    pub fn set_active_den(&self, den_id: &DenId) {
        if self.find_den(den_id).is_none() {
            debug!(den_id = %den_id, "Ignoring unknown den");
            return;
        }

        let channels = self.channels_for_den(den_id);
        let keep_current = self
            .active_channel_id()
            .is_some_and(|current| channels.iter().any(|c| c.id == current));

        let mut changes = vec![StateValue::ActiveDen(Some(den_id.clone()))];
        if !keep_current {
            let first_text = channels.iter().find(|c| c.is_text()).map(|c| c.id.clone());
            changes.push(StateValue::ActiveChannel(first_text));
        }
        self.update_with(changes, Persist::Yes);

        invariants::assert_active_channel_in_den(
            self.active_channel().as_ref(),
            self.active_den_id().as_ref(),
        );
    }

    /// Select a channel. Unknown channels are ignored.
    ///
    /// Selecting a voice channel also marks the user as being in it, but
    /// unlike `join_voice_channel` it leaves the connected-user counter and
    /// the mute/deafen/video flags alone.
    pub fn set_active_channel(&self, channel_id: &ChannelId) {
        let Some(channel) = self.find_channel(channel_id) else {
            debug!(channel_id = %channel_id, "Ignoring unknown channel");
            return;
        };

        let mut changes = vec![StateValue::ActiveChannel(Some(channel_id.clone()))];
        let already_in_it = self.is_connected_to_voice()
            && self.active_voice_channel_id().as_ref() == Some(channel_id);
        if channel.is_voice() && !already_in_it {
            changes.push(StateValue::ActiveVoiceChannel(Some(channel_id.clone())));
            changes.push(StateValue::ConnectedToVoice(true));
        }
        self.update_with(changes, Persist::Yes);
    }

    /// Pick the den/channel to show after loading: the persisted selection
    /// when it still resolves, otherwise the first den and its first text
    /// channel.
    pub(super) fn restore_selection(&self, den: Option<DenId>, channel: Option<ChannelId>) {
        let den_id = den
            .filter(|id| self.find_den(id).is_some())
            .or_else(|| self.dens().first().map(|d| d.id.clone()));
        let Some(den_id) = den_id else {
            return;
        };

        let channels = self.channels_for_den(&den_id);
        let channel_id = channel
            .filter(|id| channels.iter().any(|c| &c.id == id && c.is_text()))
            .or_else(|| channels.iter().find(|c| c.is_text()).map(|c| c.id.clone()));

        self.update_with(
            vec![
                StateValue::ActiveDen(Some(den_id)),
                StateValue::ActiveChannel(channel_id),
            ],
            Persist::No,
        );
    }
}
