//! Persisted subset of the state
//!
//! Only user-facing selection and preferences survive a restart; the dens,
//! channels and messages are re-seeded.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::theme::LEGACY_THEME_KEY;
use super::Theme;
use crate::models::{ChannelId, CurrentUser, DenId};
use crate::storage::PersistenceGateway;

/// Storage key of the snapshot blob
pub const APP_STATE_KEY: &str = "appState";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub current_theme: Option<Theme>,
    pub current_user: Option<CurrentUser>,
    pub active_den: Option<DenId>,
    pub active_channel: Option<ChannelId>,
    pub members_sidebar_visible: Option<bool>,
}

impl PersistedState {
    /// Read the snapshot, falling back to the legacy theme key for the theme.
    /// Read or decode failures yield an empty snapshot.
    pub fn load(gateway: &dyn PersistenceGateway) -> Self {
        let mut state = match gateway.get(APP_STATE_KEY) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unreadable state snapshot");
                PersistedState::default()
            }),
            Ok(None) => PersistedState::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read state snapshot");
                PersistedState::default()
            }
        };

        if state.current_theme.is_none() {
            state.current_theme = match gateway.get(LEGACY_THEME_KEY) {
                Ok(Some(value)) => value.as_str().and_then(Theme::parse),
                Ok(None) => None,
                Err(e) => {
                    warn!(error = %e, "Failed to read legacy theme");
                    None
                }
            };
        }

        state
    }
}
