use std::path::PathBuf;

use serde::Serialize;

/// What is on disk for one branch: the install directory and the version
/// ordinal recorded by the last successful patch, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledState {
    pub branch: String,
    pub game_dir: PathBuf,
    pub client_path: PathBuf,
    /// `None` means "not installed" (no marker, or an unreadable one).
    pub installed_version: Option<u32>,
}

impl InstalledState {
    pub fn client_present(&self) -> bool {
        self.client_path.is_file()
    }

    /// The recorded ordinal matches `version` and the client binary exists.
    pub fn is_current(&self, version: u32) -> bool {
        self.installed_version == Some(version) && self.client_present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_needs_both_marker_and_client() {
        let dir = tempfile::tempdir().unwrap();
        let client = dir.path().join("Client").join("HytaleClient");
        let mut state = InstalledState {
            branch: "release".into(),
            game_dir: dir.path().to_path_buf(),
            client_path: client.clone(),
            installed_version: Some(3),
        };
        assert!(!state.is_current(3));

        std::fs::create_dir_all(client.parent().unwrap()).unwrap();
        std::fs::write(&client, "").unwrap();
        assert!(state.is_current(3));
        assert!(!state.is_current(4));

        state.installed_version = None;
        assert!(!state.is_current(3));
    }
}
