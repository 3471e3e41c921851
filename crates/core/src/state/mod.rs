//! Observable state store
//!
//! Holds every piece of client state and notifies subscribers when a key
//! changes. The store is single-threaded: every `set`/`update` runs to
//! completion, subscribers included, before the caller regains control.
//! Callbacks may read from or write to the store re-entrantly.

mod dens;
mod key;
mod members;
mod messages;
mod navigation;
#[cfg(test)]
mod scenarios;
mod seed;
mod snapshot;
mod subscribers;
mod theme;
mod voice;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info, instrument, warn};

use crate::models::{Channel, ChannelId, CurrentUser, Den, DenId};
use crate::storage::PersistenceGateway;
use crate::voice::MediaState;

pub use key::{ChannelMap, MemberMap, MessageMap, RoleMap, StateKey, StateValue, Topic};
pub use snapshot::{PersistedState, APP_STATE_KEY};
pub use subscribers::{Callback, Subscription};
pub use theme::{Theme, ThemeOrigin, ThemeTransition, LEGACY_THEME_KEY};

use subscribers::SubscriberRegistry;

/// Whether a mutation should write the state snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    Yes,
    No,
}

/// Store construction options
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Theme used when nothing is persisted
    pub default_theme: Theme,
    /// Seed example dens when none exist
    pub seed_fixtures: bool,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self {
            default_theme: Theme::Dark,
            seed_fixtures: true,
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
struct StateData {
    current_user: Option<CurrentUser>,
    active_den: Option<DenId>,
    active_channel: Option<ChannelId>,
    active_voice_channel: Option<ChannelId>,
    connected_to_voice: bool,
    mic_muted: bool,
    deafened: bool,
    video: MediaState,
    screen_share: MediaState,
    dens: Vec<Den>,
    channels: ChannelMap,
    messages: MessageMap,
    members: MemberMap,
    roles: RoleMap,
    theme: Theme,
    members_sidebar_visible: bool,
    settings: HashMap<String, serde_json::Value>,
}

impl StateData {
    fn defaults(theme: Theme) -> Self {
        Self {
            theme,
            members_sidebar_visible: true,
            ..Self::default()
        }
    }

    fn read(&self, key: &StateKey) -> Option<StateValue> {
        let value = match key {
            StateKey::CurrentUser => StateValue::CurrentUser(self.current_user.clone()),
            StateKey::ActiveDen => StateValue::ActiveDen(self.active_den.clone()),
            StateKey::ActiveChannel => StateValue::ActiveChannel(self.active_channel.clone()),
            StateKey::ActiveVoiceChannel => {
                StateValue::ActiveVoiceChannel(self.active_voice_channel.clone())
            }
            StateKey::ConnectedToVoice => StateValue::ConnectedToVoice(self.connected_to_voice),
            StateKey::MicMuted => StateValue::MicMuted(self.mic_muted),
            StateKey::Deafened => StateValue::Deafened(self.deafened),
            StateKey::VideoEnabled => StateValue::VideoEnabled(self.video),
            StateKey::ScreenShareEnabled => StateValue::ScreenShareEnabled(self.screen_share),
            StateKey::Dens => StateValue::Dens(self.dens.clone()),
            StateKey::Channels => StateValue::Channels(self.channels.clone()),
            StateKey::Messages => StateValue::Messages(self.messages.clone()),
            StateKey::ChannelMessages(id) => StateValue::ChannelMessages(
                id.clone(),
                self.messages.get(id).cloned().unwrap_or_default(),
            ),
            StateKey::Members => StateValue::Members(self.members.clone()),
            StateKey::Roles => StateValue::Roles(self.roles.clone()),
            StateKey::CurrentTheme => StateValue::CurrentTheme(self.theme),
            StateKey::MembersSidebarVisible => {
                StateValue::MembersSidebarVisible(self.members_sidebar_visible)
            }
            StateKey::Setting(name) => {
                let value = self.settings.get(name)?;
                StateValue::Setting(name.clone(), Some(value.clone()))
            }
        };
        Some(value)
    }

    /// Store `value`, returning what it replaced
    fn write(&mut self, value: StateValue) -> StateValue {
        match value {
            StateValue::CurrentUser(v) => {
                StateValue::CurrentUser(std::mem::replace(&mut self.current_user, v))
            }
            StateValue::ActiveDen(v) => {
                StateValue::ActiveDen(std::mem::replace(&mut self.active_den, v))
            }
            StateValue::ActiveChannel(v) => {
                StateValue::ActiveChannel(std::mem::replace(&mut self.active_channel, v))
            }
            StateValue::ActiveVoiceChannel(v) => StateValue::ActiveVoiceChannel(
                std::mem::replace(&mut self.active_voice_channel, v),
            ),
            StateValue::ConnectedToVoice(v) => {
                StateValue::ConnectedToVoice(std::mem::replace(&mut self.connected_to_voice, v))
            }
            StateValue::MicMuted(v) => StateValue::MicMuted(std::mem::replace(&mut self.mic_muted, v)),
            StateValue::Deafened(v) => StateValue::Deafened(std::mem::replace(&mut self.deafened, v)),
            StateValue::VideoEnabled(v) => {
                StateValue::VideoEnabled(std::mem::replace(&mut self.video, v))
            }
            StateValue::ScreenShareEnabled(v) => {
                StateValue::ScreenShareEnabled(std::mem::replace(&mut self.screen_share, v))
            }
            StateValue::Dens(v) => StateValue::Dens(std::mem::replace(&mut self.dens, v)),
            StateValue::Channels(v) => StateValue::Channels(std::mem::replace(&mut self.channels, v)),
            StateValue::Messages(v) => StateValue::Messages(std::mem::replace(&mut self.messages, v)),
            StateValue::ChannelMessages(id, list) => {
                let old = self.messages.insert(id.clone(), list).unwrap_or_default();
                StateValue::ChannelMessages(id, old)
            }
            StateValue::Members(v) => StateValue::Members(std::mem::replace(&mut self.members, v)),
            StateValue::Roles(v) => StateValue::Roles(std::mem::replace(&mut self.roles, v)),
            StateValue::CurrentTheme(v) => {
                StateValue::CurrentTheme(std::mem::replace(&mut self.theme, v))
            }
            StateValue::MembersSidebarVisible(v) => StateValue::MembersSidebarVisible(
                std::mem::replace(&mut self.members_sidebar_visible, v),
            ),
            StateValue::Setting(name, v) => {
                let old = match v {
                    Some(v) => self.settings.insert(name.clone(), v),
                    None => self.settings.remove(&name),
                };
                StateValue::Setting(name, old)
            }
        }
    }

    fn snapshot(&self) -> PersistedState {
        PersistedState {
            current_theme: Some(self.theme),
            current_user: self.current_user.clone(),
            active_den: self.active_den.clone(),
            active_channel: self.active_channel.clone(),
            members_sidebar_visible: Some(self.members_sidebar_visible),
        }
    }
}

/// Process-wide client state with publish/subscribe change notification
pub struct StateStore {
    data: RefCell<StateData>,
    subscribers: Rc<RefCell<SubscriberRegistry>>,
    persistence: Rc<dyn PersistenceGateway>,
    options: StoreOptions,
    initialized: Cell<bool>,
}

impl StateStore {
    pub fn new(persistence: Rc<dyn PersistenceGateway>, options: StoreOptions) -> Self {
        Self {
            data: RefCell::new(StateData::defaults(options.default_theme)),
            subscribers: Rc::new(RefCell::new(SubscriberRegistry::default())),
            persistence,
            options,
            initialized: Cell::new(false),
        }
    }

    /// Load the persisted snapshot, seed example data if no dens exist, and
    /// restore the active den/channel selection. Repeated calls do nothing.
    #[instrument(skip(self))]
    pub fn init(&self) {
        if self.initialized.get() {
            debug!("State store already initialized");
            return;
        }

        let persisted = PersistedState::load(self.persistence.as_ref());
        {
            let mut data = self.data.borrow_mut();
            if let Some(theme) = persisted.current_theme {
                data.theme = theme;
            }
            if let Some(visible) = persisted.members_sidebar_visible {
                data.members_sidebar_visible = visible;
            }
            if persisted.current_user.is_some() {
                data.current_user = persisted.current_user.clone();
            }

            if data.dens.is_empty() && self.options.seed_fixtures {
                let fixtures = seed::fixtures();
                info!(dens = fixtures.dens.len(), "Seeding example dens");
                data.dens = fixtures.dens;
                data.channels = fixtures.channels;
                data.members = fixtures.members;
                data.messages = fixtures.messages;
                if data.current_user.is_none() {
                    data.current_user = Some(seed::local_user());
                }
            }
        }
        self.initialized.set(true);

        self.restore_selection(persisted.active_den, persisted.active_channel);
        info!(
            theme = %self.theme(),
            active_den = ?self.active_den_id(),
            active_channel = ?self.active_channel_id(),
            "State store initialized"
        );
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Current value of `key`; `None` only for settings never set
    pub fn get(&self, key: &StateKey) -> Option<StateValue> {
        self.data.borrow().read(key)
    }

    /// Replace a value, notify subscribers, then persist the snapshot
    pub fn set(&self, value: StateValue) {
        self.set_with(value, Persist::Yes);
    }

    pub fn set_with(&self, value: StateValue, persist: Persist) {
        let key = value.key();
        let old = self.data.borrow_mut().write(value.clone());
        self.notify(&key, &value, &old);
        if persist == Persist::Yes {
            self.persist();
        }
    }

    /// Apply several values as a batch
    ///
    /// All values are written before any subscriber runs, so callbacks see
    /// the complete batch. Each key is then notified once, in order of
    /// first appearance: a repeated key reports its last value against the
    /// value it held before the batch. The snapshot is written once at the
    /// end.
    pub fn update(&self, values: Vec<StateValue>) {
        self.update_with(values, Persist::Yes);
    }

    pub fn update_with(&self, values: Vec<StateValue>, persist: Persist) {
        let mut changes: Vec<(StateKey, StateValue, StateValue)> = Vec::new();
        {
            let mut data = self.data.borrow_mut();
            for value in values {
                let key = value.key();
                let old = data.write(value.clone());
                match changes.iter_mut().find(|(k, _, _)| *k == key) {
                    Some((_, latest, _)) => *latest = value,
                    None => changes.push((key, value, old)),
                }
            }
        }

        for (key, new, old) in &changes {
            self.notify(key, new, old);
        }
        if persist == Persist::Yes {
            self.persist();
        }
    }

    /// Re-notify subscribers of `key` with its current value, without
    /// changing it
    pub fn touch(&self, key: &StateKey) {
        if let Some(value) = self.get(key) {
            self.notify(key, &value, &value);
        }
    }

    /// Register `callback` for a key (or every key with `Topic::All`)
    pub fn subscribe<F>(&self, topic: impl Into<Topic>, callback: F) -> Subscription
    where
        F: Fn(&StateValue, &StateValue) + 'static,
    {
        let topic = topic.into();
        let id = self
            .subscribers
            .borrow_mut()
            .add(topic.clone(), Rc::new(callback));
        Subscription::new(&self.subscribers, topic, id)
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.subscribers.borrow().count(topic)
    }

    fn notify(&self, key: &StateKey, new: &StateValue, old: &StateValue) {
        let listeners = self.subscribers.borrow().listeners(key);
        for callback in listeners {
            callback(new, old);
        }
    }

    /// Write the snapshot; failures are logged and never undo the mutation
    fn persist(&self) {
        let snapshot = self.data.borrow().snapshot();
        let result = serde_json::to_value(&snapshot)
            .map_err(crate::Error::from)
            .and_then(|value| self.persistence.set(APP_STATE_KEY, &value));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist state snapshot");
        }
    }

    // Typed reads

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.data.borrow().current_user.clone()
    }

    pub fn active_den_id(&self) -> Option<DenId> {
        self.data.borrow().active_den.clone()
    }

    pub fn active_channel_id(&self) -> Option<ChannelId> {
        self.data.borrow().active_channel.clone()
    }

    pub fn active_voice_channel_id(&self) -> Option<ChannelId> {
        self.data.borrow().active_voice_channel.clone()
    }

    pub fn is_connected_to_voice(&self) -> bool {
        self.data.borrow().connected_to_voice
    }

    pub fn mic_muted(&self) -> bool {
        self.data.borrow().mic_muted
    }

    pub fn deafened(&self) -> bool {
        self.data.borrow().deafened
    }

    pub fn video_state(&self) -> MediaState {
        self.data.borrow().video
    }

    pub fn screen_share_state(&self) -> MediaState {
        self.data.borrow().screen_share
    }

    pub fn members_sidebar_visible(&self) -> bool {
        self.data.borrow().members_sidebar_visible
    }

    pub fn dens(&self) -> Vec<Den> {
        self.data.borrow().dens.clone()
    }

    // Projections

    pub fn find_den(&self, den_id: &DenId) -> Option<Den> {
        self.data.borrow().dens.iter().find(|d| &d.id == den_id).cloned()
    }

    /// The active den, or `None` when nothing is selected or it was deleted
    pub fn active_den(&self) -> Option<Den> {
        self.active_den_id().and_then(|id| self.find_den(&id))
    }

    /// Locate a channel in any den
    pub fn find_channel(&self, channel_id: &ChannelId) -> Option<Channel> {
        self.data
            .borrow()
            .channels
            .values()
            .flatten()
            .find(|c| &c.id == channel_id)
            .cloned()
    }

    pub fn active_channel(&self) -> Option<Channel> {
        self.active_channel_id().and_then(|id| self.find_channel(&id))
    }

    /// Channels of a den in list order; empty for unknown dens
    pub fn channels_for_den(&self, den_id: &DenId) -> Vec<Channel> {
        self.data
            .borrow()
            .channels
            .get(den_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn toggle_members_sidebar(&self) -> bool {
        let visible = !self.members_sidebar_visible();
        self.set(StateValue::MembersSidebarVisible(visible));
        visible
    }

    pub fn set_current_user(&self, user: CurrentUser) {
        self.set(StateValue::CurrentUser(Some(user)));
    }
}
