pub mod discovery;

use serde::{Deserialize, Serialize};

pub use discovery::{build_version_list, discover_versions};

/// One selectable game version.
///
/// The entry flagged `is_latest` is a duplicate of the highest discovered
/// ordinal and always comes first in a discovered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVersion {
    pub name: String,
    pub version: u32,
    pub branch: String,
    pub is_latest: bool,
}

impl GameVersion {
    pub fn numbered(version: u32, branch: &str) -> Self {
        Self {
            name: format!("Version {version}"),
            version,
            branch: branch.to_string(),
            is_latest: false,
        }
    }

    pub fn latest(version: u32, branch: &str) -> Self {
        Self {
            name: "Latest Version".to_string(),
            version,
            branch: branch.to_string(),
            is_latest: true,
        }
    }
}

impl std::fmt::Display for GameVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
