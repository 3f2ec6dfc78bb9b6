use std::sync::Arc;

use serde_json::Value;

use crate::core::config::LauncherConfig;
use crate::core::error::LauncherResult;
use crate::core::events::EventSink;
use crate::core::launch::Launcher;

use super::settings::{SettingsStore, LAST_PLAYER_KEY};

/// Everything a front end needs, wired once at startup.
pub struct AppState {
    pub config: Arc<LauncherConfig>,
    pub settings: SettingsStore,
    pub launcher: Launcher,
}

impl AppState {
    pub fn new(config: LauncherConfig, events: Arc<dyn EventSink>) -> LauncherResult<Self> {
        let config = Arc::new(config);
        let settings = SettingsStore::new(config.settings_path());
        let launcher = Launcher::new(config.clone(), events)?;
        Ok(Self {
            config,
            settings,
            launcher,
        })
    }

    /// Branch to use when the caller did not pick one.
    pub fn branch(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_string)
            .unwrap_or_else(|| self.config.default_branch.clone())
    }

    pub fn last_player(&self) -> Option<String> {
        self.settings
            .get_string(LAST_PLAYER_KEY)
            .filter(|name| !name.trim().is_empty())
    }

    pub fn remember_player(&self, name: &str) {
        self.settings
            .set(LAST_PLAYER_KEY, Value::String(name.to_string()));
    }
}
