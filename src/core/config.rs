use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::platform::{executable_name, platform_arch, platform_os};

const LAUNCHER_DIR_NAME: &str = "TaleLauncher";
const GAME_DIR_NAME: &str = "Hytale";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_BRANCH: &str = "release";
pub const CONSECUTIVE_MISSES_TO_STOP: u32 = 5;
pub const PROBE_TIMEOUT_SECS: u64 = 10;

/// Static launcher configuration: where things live on disk and which
/// endpoints serve patches, runtimes and the patch tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LauncherConfig {
    pub launcher_dir: PathBuf,
    pub game_base_dir: PathBuf,
    pub default_branch: String,
    /// Already encodes platform and architecture.
    pub patch_base_url: String,
    /// Contains a `{branch}` placeholder.
    pub runtime_manifest_url: String,
    pub patch_tool_url: String,
    pub consecutive_misses_to_stop: u32,
    pub probe_timeout_secs: u64,
    pub client_executable: String,
    pub runtime_executable: String,
    pub patch_tool_executable: String,
}

/// Optional overrides read from `<launcher dir>/config.json`.
/// Paths are never overridden here; they follow the data root.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    default_branch: Option<String>,
    patch_base_url: Option<String>,
    runtime_manifest_url: Option<String>,
    patch_tool_url: Option<String>,
    consecutive_misses_to_stop: Option<u32>,
    probe_timeout_secs: Option<u64>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self::for_data_root(&default_data_root())
    }
}

impl LauncherConfig {
    /// Build the default layout rooted at `data_root` (normally the user's
    /// data directory).
    pub fn for_data_root(data_root: &Path) -> Self {
        let os = platform_os();
        let arch = platform_arch();
        Self {
            launcher_dir: data_root.join(LAUNCHER_DIR_NAME),
            game_base_dir: data_root.join(GAME_DIR_NAME),
            default_branch: DEFAULT_BRANCH.to_string(),
            patch_base_url: format!("https://game-patches.hytale.com/patches/{os}/{arch}"),
            runtime_manifest_url: "https://launcher.hytale.com/version/{branch}/jre.json".into(),
            patch_tool_url: format!(
                "https://broth.itch.zone/butler/{os}-{arch}/LATEST/archive/default"
            ),
            consecutive_misses_to_stop: CONSECUTIVE_MISSES_TO_STOP,
            probe_timeout_secs: PROBE_TIMEOUT_SECS,
            client_executable: executable_name("HytaleClient"),
            runtime_executable: executable_name("java"),
            patch_tool_executable: executable_name("butler"),
        }
    }

    /// Default layout plus any overrides found in `config.json`.
    ///
    /// A missing file is normal; an unreadable one is logged and ignored.
    pub fn load(data_root: Option<PathBuf>) -> Self {
        let root = data_root.unwrap_or_else(default_data_root);
        let mut config = Self::for_data_root(&root);
        let path = config.launcher_dir.join(CONFIG_FILE);

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => {
                debug!("No launcher config at {:?}, using defaults", path);
                return config;
            }
        };

        match serde_json::from_str::<ConfigFile>(&raw) {
            Ok(file) => config.apply(file),
            Err(e) => warn!("Ignoring unreadable launcher config {:?}: {}", path, e),
        }
        config
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(branch) = file.default_branch {
            self.default_branch = branch;
        }
        if let Some(url) = file.patch_base_url {
            self.patch_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = file.runtime_manifest_url {
            self.runtime_manifest_url = url;
        }
        if let Some(url) = file.patch_tool_url {
            self.patch_tool_url = url;
        }
        if let Some(misses) = file.consecutive_misses_to_stop {
            self.consecutive_misses_to_stop = misses.max(1);
        }
        if let Some(secs) = file.probe_timeout_secs {
            self.probe_timeout_secs = secs;
        }
    }

    // ── Launcher-owned paths ────────────────────────────

    pub fn cache_dir(&self) -> PathBuf {
        self.launcher_dir.join("cache")
    }

    pub fn patch_tool_dir(&self) -> PathBuf {
        self.launcher_dir.join("butler")
    }

    pub fn patch_tool_path(&self) -> PathBuf {
        self.patch_tool_dir().join(&self.patch_tool_executable)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.launcher_dir.join("settings.json")
    }

    pub fn identities_path(&self) -> PathBuf {
        self.launcher_dir.join("players.json")
    }

    pub fn game_log_path(&self) -> PathBuf {
        self.launcher_dir.join("game.log")
    }

    // ── Game-owned paths ────────────────────────────────

    fn branch_package_dir(&self, branch: &str) -> PathBuf {
        self.game_base_dir
            .join("install")
            .join(branch)
            .join("package")
    }

    pub fn game_dir(&self, branch: &str) -> PathBuf {
        self.branch_package_dir(branch).join("game").join("latest")
    }

    pub fn client_path(&self, branch: &str) -> PathBuf {
        self.game_dir(branch)
            .join("Client")
            .join(&self.client_executable)
    }

    pub fn runtime_dir(&self, branch: &str) -> PathBuf {
        self.branch_package_dir(branch).join("jre").join("latest")
    }

    pub fn runtime_executable_path(&self, branch: &str) -> PathBuf {
        self.runtime_dir(branch)
            .join("bin")
            .join(&self.runtime_executable)
    }

    pub fn user_data_dir(&self) -> PathBuf {
        self.game_base_dir.join("UserData")
    }

    // ── Endpoints ───────────────────────────────────────

    pub fn patch_url(&self, branch: &str, ordinal: u32) -> String {
        format!("{}/{}/0/{}.pwr", self.patch_base_url, branch, ordinal)
    }

    pub fn patch_cache_path(&self, branch: &str, ordinal: u32) -> PathBuf {
        self.cache_dir().join(format!("{branch}_0_{ordinal}.pwr"))
    }

    pub fn runtime_manifest_url_for(&self, branch: &str) -> String {
        self.runtime_manifest_url.replace("{branch}", branch)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn default_data_root() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from("."))
}
