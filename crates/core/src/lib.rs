//! Foxden Core Library
//!
//! Models, the reactive state store, voice session control and storage for
//! the Foxden chat client.

pub mod error;
pub mod invariants;
pub mod models;
pub mod notify;
pub mod permissions;
pub mod state;
pub mod storage;
pub mod voice;

pub use error::{Error, Result};
pub use models::*;
pub use notify::{LogNotifier, NotificationGateway, RecordingNotifier};
pub use permissions::*;
pub use state::{
    PersistedState, Persist, StateKey, StateStore, StateValue, StoreOptions, Subscription, Theme,
    ThemeOrigin, ThemeTransition, Topic,
};
pub use storage::{Database, KvStore, MemoryPersistence, PersistenceGateway};
pub use voice::{
    MediaDeviceGateway, MediaError, MediaKind, MediaState, SimulatedDevices, VoiceSession,
    VoiceSessionController,
};
