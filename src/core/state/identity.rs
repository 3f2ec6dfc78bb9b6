use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{LauncherError, LauncherResult};

/// Persisted `lowercase player name -> offline id` map (`players.json`).
#[derive(Debug)]
pub struct PlayerIdentityStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl PlayerIdentityStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stable id for `player_name`, created on first use.
    ///
    /// Always returns an id: if the map cannot be written the freshly
    /// generated or normalized value is still handed back.
    pub fn resolve(&self, player_name: &str) -> String {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let key = player_name.to_lowercase();
        let mut players = self.load();

        let (id, changed) = match players.get(&key) {
            None => {
                let id = Uuid::new_v4().simple().to_string();
                info!("Created offline identity for '{}'", key);
                (id, true)
            }
            Some(existing) if existing.contains('-') => (existing.replace('-', ""), true),
            Some(existing) => (existing.clone(), false),
        };

        if changed {
            players.insert(key, id.clone());
            if let Err(e) = self.save(&players) {
                warn!("Could not persist player identities: {}", e);
            }
        }
        id
    }

    fn load(&self) -> BTreeMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return BTreeMap::new(),
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring unreadable {:?}: {}", self.path, e);
            BTreeMap::new()
        })
    }

    fn save(&self, players: &BTreeMap<String, String>) -> LauncherResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(players)?;
        std::fs::write(&self.path, json).map_err(|e| LauncherError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(path: &Path) -> BTreeMap<String, String> {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn first_lookup_creates_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlayerIdentityStore::new(dir.path().join("players.json"));

        let id = store.resolve("Steve");

        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
        assert_eq!(stored(store.path()).get("steve"), Some(&id));
    }

    #[test]
    fn lookup_is_stable_and_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlayerIdentityStore::new(dir.path().join("players.json"));

        let first = store.resolve("Alex");
        assert_eq!(store.resolve("ALEX"), first);
        assert_eq!(store.resolve("alex"), first);
        assert_ne!(store.resolve("Steve"), first);
        assert_eq!(stored(store.path()).len(), 2);
    }

    #[test]
    fn legacy_hyphenated_id_is_normalized_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players.json");
        std::fs::write(
            &path,
            r#"{ "steve": "123e4567-e89b-12d3-a456-426614174000" }"#,
        )
        .unwrap();
        let store = PlayerIdentityStore::new(path);

        let id = store.resolve("Steve");

        assert_eq!(id, "123e4567e89b12d3a456426614174000");
        assert_eq!(stored(store.path()).get("steve"), Some(&id));
    }

    #[test]
    fn unwritable_store_still_resolves() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be makes every write fail.
        let path = dir.path().join("players.json");
        std::fs::create_dir_all(&path).unwrap();
        let store = PlayerIdentityStore::new(path);

        let id = store.resolve("Steve");
        assert_eq!(id.len(), 32);
    }
}
