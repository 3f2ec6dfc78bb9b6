use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::model::InstalledState;
use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};

/// Plain-text integer marker in the root of each branch install.
pub const VERSION_MARKER: &str = ".version";

/// Reads and records per-branch install state.
#[derive(Debug, Clone)]
pub struct InstallManager {
    config: LauncherConfig,
}

impl InstallManager {
    pub fn new(config: LauncherConfig) -> Self {
        Self { config }
    }

    pub fn marker_path(&self, branch: &str) -> PathBuf {
        self.config.game_dir(branch).join(VERSION_MARKER)
    }

    /// Current state of `branch`. Never fails: anything unreadable counts
    /// as not installed.
    pub async fn state(&self, branch: &str) -> InstalledState {
        let marker = self.marker_path(branch);
        InstalledState {
            branch: branch.to_string(),
            game_dir: self.config.game_dir(branch),
            client_path: self.config.client_path(branch),
            installed_version: read_marker(&marker).await,
        }
    }

    /// Persist `version` as the installed ordinal for `branch`.
    pub async fn record(&self, branch: &str, version: u32) -> LauncherResult<()> {
        let marker = self.marker_path(branch);
        if let Some(parent) = marker.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(&marker, version.to_string())
            .await
            .map_err(|e| LauncherError::Io {
                path: marker.clone(),
                source: e,
            })?;
        info!("Recorded {} as version {}", branch, version);
        Ok(())
    }
}

async fn read_marker(marker: &Path) -> Option<u32> {
    let raw = match tokio::fs::read_to_string(marker).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!("No version marker at {:?}: {}", marker, e);
            return None;
        }
    };
    match raw.trim().parse::<u32>() {
        Ok(version) => Some(version),
        Err(e) => {
            warn!("Corrupt version marker at {:?}: {}", marker, e);
            None
        }
    }
}
