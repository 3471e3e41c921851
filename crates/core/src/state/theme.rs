//! Colour theme selection

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Persist, StateStore, StateValue};
use crate::storage::PersistenceGateway;

/// Storage key holding only the theme string, read before the full state
/// is available
pub const LEGACY_THEME_KEY: &str = "foxden-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// Root element class for this theme
    pub fn css_class(&self) -> &'static str {
        match self {
            Theme::Dark => "theme-dark",
            Theme::Light => "theme-light",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen point the theme switch was triggered from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeOrigin {
    pub x: f64,
    pub y: f64,
}

/// A theme change the shell should animate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThemeTransition {
    pub from: Theme,
    pub to: Theme,
    pub origin: Option<ThemeOrigin>,
}

impl ThemeTransition {
    /// (class to remove, class to add)
    pub fn class_swap(&self) -> (&'static str, &'static str) {
        (self.from.css_class(), self.to.css_class())
    }
}

impl StateStore {
    pub fn theme(&self) -> Theme {
        self.data.borrow().theme
    }

    /// Switch theme by name. Unknown names and redundant switches are
    /// ignored and return `None`.
    pub fn set_theme(&self, name: &str, origin: Option<ThemeOrigin>) -> Option<ThemeTransition> {
        let Some(to) = Theme::parse(name) else {
            debug!(name, "Ignoring unknown theme");
            return None;
        };

        let from = self.theme();
        if from == to {
            debug!(theme = %to, "Theme unchanged");
            return None;
        }

        self.set_with(StateValue::CurrentTheme(to), Persist::Yes);
        if let Err(e) = self
            .persistence
            .set(LEGACY_THEME_KEY, &serde_json::Value::from(to.as_str()))
        {
            warn!(error = %e, "Failed to write legacy theme key");
        }

        Some(ThemeTransition { from, to, origin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StoreOptions;
    use crate::storage::MemoryPersistence;
    use serde_json::json;
    use std::rc::Rc;

    fn store() -> (StateStore, Rc<MemoryPersistence>) {
        let persistence = Rc::new(MemoryPersistence::new());
        let store = StateStore::new(persistence.clone(), StoreOptions::new());
        store.init();
        (store, persistence)
    }

    #[test]
    fn parse_known_themes_only() {
        assert_eq!(Theme::parse("light"), Some(Theme::Light));
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse("Light"), None);
        assert_eq!(Theme::parse("solarized"), None);
    }

    #[test]
    fn transition_swaps_classes() {
        let t = ThemeTransition {
            from: Theme::Dark,
            to: Theme::Light,
            origin: None,
        };
        assert_eq!(t.class_swap(), ("theme-dark", "theme-light"));
    }

    #[test]
    fn set_theme_writes_legacy_key() {
        let (store, persistence) = store();
        assert_eq!(persistence.snapshot(LEGACY_THEME_KEY), None);

        store.set_theme("light", None).unwrap();
        assert_eq!(persistence.snapshot(LEGACY_THEME_KEY), Some(json!("light")));

        store.set_theme("dark", None).unwrap();
        assert_eq!(persistence.snapshot(LEGACY_THEME_KEY), Some(json!("dark")));
    }

    #[test]
    fn set_theme_passes_origin_through() {
        let (store, _) = store();
        let origin = ThemeOrigin { x: 10.0, y: 20.0 };

        let transition = store.set_theme("light", Some(origin)).unwrap();
        assert_eq!(
            transition,
            ThemeTransition {
                from: Theme::Dark,
                to: Theme::Light,
                origin: Some(origin),
            }
        );
        assert_eq!(store.theme(), Theme::Light);
    }
}
