use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::core::archive::extract_and_flatten;
use crate::core::config::LauncherConfig;
use crate::core::downloader::Transfer;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSink, LaunchStatus, LauncherEvent};
use crate::core::platform::{self, is_windows, mark_executable};

/// Branch-scoped runtime manifest:
/// `{ "download_url": { "<os>": { "<arch>": { "url": ... } } } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeManifest {
    #[serde(default)]
    pub download_url: HashMap<String, HashMap<String, RuntimeDownload>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeDownload {
    pub url: String,
}

impl RuntimeManifest {
    pub fn entry_for(&self, os: &str, arch: &str) -> Option<&RuntimeDownload> {
        self.download_url.get(os)?.get(arch)
    }
}

/// Which runtime the game will be started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeSelection {
    /// Launcher-provisioned runtime under the branch install.
    Managed(PathBuf),
    /// Resolved from the system search path (or the bare executable name).
    System(PathBuf),
}

impl RuntimeSelection {
    pub fn path(&self) -> &Path {
        match self {
            RuntimeSelection::Managed(path) | RuntimeSelection::System(path) => path,
        }
    }
}

/// Make sure the managed runtime for `branch` is present and return its
/// executable. Already-present runtimes return immediately without any
/// network access.
#[instrument(skip(transfer, config, events))]
pub async fn ensure_runtime(
    transfer: &dyn Transfer,
    config: &LauncherConfig,
    branch: &str,
    events: &dyn EventSink,
) -> LauncherResult<PathBuf> {
    let runtime_bin = config.runtime_executable_path(branch);
    if runtime_bin.exists() {
        info!("Runtime already installed at {:?}", runtime_bin);
        events.status(LaunchStatus::RuntimeInstalled);
        events.progress(100.0);
        return Ok(runtime_bin);
    }

    info!("Runtime not found at {:?}, starting download", runtime_bin);
    events.status(LaunchStatus::DownloadingRuntime);

    let manifest_url = config.runtime_manifest_url_for(branch);
    debug!("Fetching runtime manifest from {}", manifest_url);
    let raw = transfer.fetch_json(&manifest_url).await?;
    let manifest: RuntimeManifest = serde_json::from_value(raw)
        .map_err(|e| LauncherError::Manifest(format!("malformed manifest {manifest_url}: {e}")))?;

    let (os, arch) = (platform::platform_os(), platform::platform_arch());
    let download = manifest.entry_for(os, arch).ok_or_else(|| {
        LauncherError::Manifest(format!("No runtime download found for {os} {arch}"))
    })?;

    let cache_path = config
        .cache_dir()
        .join(archive_file_name(&download.url, "runtime.zip"));
    info!("Downloading runtime from {}", download.url);
    let report = |done: u64, total: u64| {
        if let Some(event) = LauncherEvent::transfer(done, total) {
            events.emit(event);
        }
    };
    transfer
        .download(&download.url, &cache_path, Some(&report))
        .await?;

    events.status(LaunchStatus::ExtractingRuntime);
    let runtime_dir = config.runtime_dir(branch);
    info!("Extracting runtime to {:?}", runtime_dir);
    extract_and_flatten(&cache_path, &runtime_dir).await?;

    if let Err(e) = tokio::fs::remove_file(&cache_path).await {
        warn!("Could not remove cached archive {:?}: {}", cache_path, e);
    }

    if !runtime_bin.exists() {
        return Err(LauncherError::Extraction { path: runtime_bin });
    }
    mark_executable(&runtime_bin)?;

    info!("Runtime installed at {:?}", runtime_bin);
    events.status(LaunchStatus::RuntimeReady);
    Ok(runtime_bin)
}

/// Look the runtime up on the search path (`where` / `which`), falling
/// back to the bare executable name.
pub async fn resolve_system_runtime(executable: &str) -> PathBuf {
    let locator = if is_windows() { "where" } else { "which" };
    match tokio::process::Command::new(locator)
        .arg(executable)
        .output()
        .await
    {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            match stdout.lines().map(str::trim).find(|line| !line.is_empty()) {
                Some(found) => PathBuf::from(found),
                None => PathBuf::from(executable),
            }
        }
        Ok(_) => PathBuf::from(executable),
        Err(e) => {
            debug!("{} lookup failed: {}", locator, e);
            PathBuf::from(executable)
        }
    }
}

/// Last path segment of `url`, or `fallback` when there is none.
pub fn archive_file_name(url: &str, fallback: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.last().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
