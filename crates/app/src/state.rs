//! Application state management

use std::path::{Path, PathBuf};
use std::rc::Rc;

use foxden_core::{
    Database, Error, LogNotifier, NotificationGateway, PersistenceGateway, Result,
    SimulatedDevices, StateStore, Subscription, Topic, VoiceSessionController,
};

use crate::config::{self, AppConfig};
use crate::console::ConsoleNotifier;

pub const DATABASE_FILE: &str = "foxden.db";

/// Main application state
pub struct AppState {
    pub store: Rc<StateStore>,
    pub voice: VoiceSessionController<SimulatedDevices>,
    data_dir: PathBuf,
    change_log: Subscription,
}

impl AppState {
    /// Open the database in the data directory and bring the store up
    pub fn new(config: &AppConfig) -> Result<Self> {
        let data_dir = match &config.data_dir {
            Some(dir) => dir.clone(),
            None => Self::data_path()?,
        };
        std::fs::create_dir_all(&data_dir)?;

        let db = Database::open(data_dir.join(DATABASE_FILE))?;
        Ok(Self::with_persistence(Rc::new(db), config, data_dir))
    }

    pub fn with_persistence(
        persistence: Rc<dyn PersistenceGateway>,
        config: &AppConfig,
        data_dir: PathBuf,
    ) -> Self {
        let store = Rc::new(StateStore::new(persistence, config.store_options()));
        store.init();

        let notifier: Rc<dyn NotificationGateway> = if config.desktop_notifications {
            Rc::new(ConsoleNotifier)
        } else {
            Rc::new(LogNotifier)
        };
        let voice = VoiceSessionController::new(store.clone(), SimulatedDevices::new(), notifier)
            .with_screen_source(config.screen_source.clone());

        let change_log = store.subscribe(Topic::All, |new, _| {
            tracing::debug!(key = %new.key(), "State changed");
        });

        Self {
            store,
            voice,
            data_dir,
            change_log,
        }
    }

    fn data_path() -> Result<PathBuf> {
        let dirs = config::project_dirs().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })?;

        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Leave voice and stop logging changes
    pub fn shutdown(&mut self) {
        self.voice.disconnect();
        self.change_log.unsubscribe();
        tracing::info!("Foxden stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foxden_core::{ChannelId, MemoryPersistence, Theme};

    #[test]
    fn opens_database_in_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: Some(dir.path().join("data")),
            default_theme: Theme::Light,
            ..AppConfig::default()
        };

        let state = AppState::new(&config).unwrap();
        assert!(state.data_dir().join(DATABASE_FILE).exists());
        assert!(state.store.is_initialized());
        assert_eq!(state.store.theme(), Theme::Light);
    }

    #[test]
    fn shutdown_leaves_voice() {
        let config = AppConfig {
            desktop_notifications: false,
            ..AppConfig::default()
        };
        let mut state = AppState::with_persistence(
            Rc::new(MemoryPersistence::new()),
            &config,
            PathBuf::from("."),
        );
        state.voice.connect(&ChannelId::from("vc-lounge"));
        assert!(state.store.is_connected_to_voice());

        state.shutdown();
        assert!(!state.store.is_connected_to_voice());
        assert_eq!(state.voice.media().open_streams(), 0);
    }
}
