use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tracing::{error, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Last player name typed into the launcher.
pub const LAST_PLAYER_KEY: &str = "playerName";

/// JSON key-value settings persisted synchronously to `settings.json`.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str, default: Value) -> Value {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.load().remove(key).unwrap_or(default)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key, Value::Null) {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn set(&self, key: &str, value: Value) {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut settings = self.load();
        settings.insert(key.to_string(), value);
        if let Err(e) = self.save(&settings) {
            error!("Error saving settings: {}", e);
        }
    }

    pub fn all(&self) -> Map<String, Value> {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.load()
    }

    fn load(&self) -> Map<String, Value> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return Map::new(),
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!("Settings file {:?} is not an object, ignoring", self.path);
                Map::new()
            }
            Err(e) => {
                warn!("Error loading settings {:?}: {}", self.path, e);
                Map::new()
            }
        }
    }

    fn save(&self, settings: &Map<String, Value>) -> LauncherResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json).map_err(|e| LauncherError::io(&self.path, e))
    }
}
