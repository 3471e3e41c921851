//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use std::collections::HashSet;

use crate::models::{Channel, ChannelId, DenId};

/// Connected to voice exactly when a voice channel is active
pub fn assert_voice_session_invariants(connected: bool, active: Option<&ChannelId>) {
    debug_assert!(
        connected == active.is_some(),
        "Voice connected={} but active voice channel is {:?}",
        connected,
        active
    );
}

/// The selected text channel must belong to the selected den
pub fn assert_active_channel_in_den(channel: Option<&Channel>, den_id: Option<&DenId>) {
    let Some(channel) = channel else {
        return;
    };
    debug_assert!(
        Some(&channel.den_id) == den_id,
        "Active channel {} belongs to den {} but active den is {:?}",
        channel.id,
        channel.den_id,
        den_id
    );
}

/// Channel ids are unique within a den
pub fn assert_unique_channel_ids(channels: &[Channel]) {
    let mut seen = HashSet::new();
    for channel in channels {
        debug_assert!(
            seen.insert(&channel.id),
            "Duplicate channel id {}",
            channel.id
        );
    }
}
