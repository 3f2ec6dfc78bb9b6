// ─── Butler ───
// Self-provisioning wrapper around the external `butler` diff/patch tool.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::core::archive::extract_and_flatten;
use crate::core::config::LauncherConfig;
use crate::core::downloader::Transfer;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSink, LaunchStatus, LauncherEvent};
use crate::core::platform::mark_executable;

use super::PatchApplier;

/// Scratch directory name under the install directory.
pub const STAGING_DIR_NAME: &str = "staging-temp";
const TOOL_ARCHIVE_NAME: &str = "butler.zip";

pub struct ButlerPatcher {
    transfer: Arc<dyn Transfer>,
    tool_dir: PathBuf,
    tool_path: PathBuf,
    archive_url: String,
    cache_dir: PathBuf,
}

impl ButlerPatcher {
    pub fn new(transfer: Arc<dyn Transfer>, config: &LauncherConfig) -> Self {
        Self {
            transfer,
            tool_dir: config.patch_tool_dir(),
            tool_path: config.patch_tool_path(),
            archive_url: config.patch_tool_url.clone(),
            cache_dir: config.cache_dir(),
        }
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Download and unpack the tool unless it is already in place.
    #[instrument(skip(self, events))]
    pub async fn ensure_tool(&self, events: &dyn EventSink) -> LauncherResult<PathBuf> {
        if self.tool_path.exists() {
            return Ok(self.tool_path.clone());
        }

        info!("Patch tool missing at {:?}, downloading", self.tool_path);
        events.status(LaunchStatus::DownloadingPatchTool);
        let archive = self.cache_dir.join(TOOL_ARCHIVE_NAME);
        let report = |done: u64, total: u64| {
            if let Some(event) = LauncherEvent::transfer(done, total) {
                events.emit(event);
            }
        };
        self.transfer
            .download(&self.archive_url, &archive, Some(&report))
            .await?;

        events.status(LaunchStatus::ExtractingPatchTool);
        extract_and_flatten(&archive, &self.tool_dir).await?;
        if let Err(e) = tokio::fs::remove_file(&archive).await {
            warn!("Could not remove {:?}: {}", archive, e);
        }

        if !self.tool_path.exists() {
            return Err(LauncherError::Extraction {
                path: self.tool_path.clone(),
            });
        }
        mark_executable(&self.tool_path)?;
        Ok(self.tool_path.clone())
    }

    /// Run `butler apply` with a fresh staging directory that is removed
    /// again before returning, whatever the outcome.
    pub async fn run_apply(
        &self,
        tool: &Path,
        patch_file: &Path,
        install_dir: &Path,
    ) -> LauncherResult<()> {
        let staging = StagingDir::create(install_dir).await?;
        let args = apply_arguments(staging.path(), patch_file, install_dir);
        debug!("Spawning {:?} {:?}", tool, args);

        let result = tokio::process::Command::new(tool)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await;
        drop(staging);

        let output = result.map_err(|e| {
            error!("Patch tool spawn failed: {}", e);
            LauncherError::PatchToolSpawn(e.to_string())
        })?;

        if output.status.success() {
            info!("Patch {:?} applied to {:?}", patch_file, install_dir);
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("Unknown error")
            .to_string();
        let code = output.status.code().unwrap_or(-1);
        error!("Patch tool failed with code {}: {}", code, detail);
        Err(LauncherError::PatchTool {
            code,
            output: detail,
        })
    }
}

#[async_trait]
impl PatchApplier for ButlerPatcher {
    async fn apply(
        &self,
        patch_file: &Path,
        install_dir: &Path,
        events: &dyn EventSink,
    ) -> LauncherResult<()> {
        let tool = self.ensure_tool(events).await?;
        self.run_apply(&tool, patch_file, install_dir).await
    }
}

/// `apply --verbose --staging-dir <staging> <patch> <install>`
pub fn apply_arguments(staging: &Path, patch_file: &Path, install_dir: &Path) -> Vec<OsString> {
    vec![
        "apply".into(),
        "--verbose".into(),
        "--staging-dir".into(),
        staging.as_os_str().to_owned(),
        patch_file.as_os_str().to_owned(),
        install_dir.as_os_str().to_owned(),
    ]
}

/// Staging directory that removes itself on drop.
struct StagingDir {
    path: PathBuf,
}

impl StagingDir {
    async fn create(install_dir: &Path) -> LauncherResult<Self> {
        let path = install_dir.join(STAGING_DIR_NAME);
        // Leftovers from an interrupted run would leak partial merge state.
        if tokio::fs::metadata(&path).await.is_ok() {
            tokio::fs::remove_dir_all(&path)
                .await
                .map_err(|e| LauncherError::io(&path, e))?;
        }
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| LauncherError::io(&path, e))?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        if let Err(source) = std::fs::remove_dir_all(&self.path) {
            warn!("Failed to remove staging dir {:?}: {}", self.path, source);
        }
    }
}
