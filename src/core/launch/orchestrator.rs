// ─── Launch Orchestrator ───
// Runtime -> install check -> patch -> spawn, strictly in that order.
// Only runtime provisioning may fail softly; everything after it aborts
// the launch and is reported as an error status.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::core::config::LauncherConfig;
use crate::core::downloader::{Downloader, Transfer};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{EventSink, LaunchStatus, LauncherEvent};
use crate::core::instance::{InstallManager, InstalledState};
use crate::core::java::{ensure_runtime, resolve_system_runtime, RuntimeSelection};
use crate::core::patch::{ButlerPatcher, PatchApplier};
use crate::core::state::PlayerIdentityStore;
use crate::core::version::{discover_versions, GameVersion};

use super::task::{spawn_game, GameLaunch};

pub struct Launcher {
    config: Arc<LauncherConfig>,
    transfer: Arc<dyn Transfer>,
    patcher: Arc<dyn PatchApplier>,
    installs: InstallManager,
    identities: PlayerIdentityStore,
    events: Arc<dyn EventSink>,
    busy: AtomicBool,
}

impl Launcher {
    /// Launcher backed by the HTTP downloader and the butler patch tool.
    pub fn new(config: Arc<LauncherConfig>, events: Arc<dyn EventSink>) -> LauncherResult<Self> {
        let transfer: Arc<dyn Transfer> = Arc::new(Downloader::new(config.probe_timeout())?);
        let patcher = Arc::new(ButlerPatcher::new(transfer.clone(), &config));
        Ok(Self::with_components(config, transfer, patcher, events))
    }

    pub fn with_components(
        config: Arc<LauncherConfig>,
        transfer: Arc<dyn Transfer>,
        patcher: Arc<dyn PatchApplier>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            installs: InstallManager::new(config.as_ref().clone()),
            identities: PlayerIdentityStore::new(config.identities_path()),
            config,
            transfer,
            patcher,
            events,
            busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn identities(&self) -> &PlayerIdentityStore {
        &self.identities
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn available_versions(&self, branch: &str) -> Vec<GameVersion> {
        discover_versions(
            self.transfer.as_ref(),
            &self.config,
            branch,
            self.events.as_ref(),
        )
        .await
    }

    pub async fn install_state(&self, branch: &str) -> InstalledState {
        self.installs.state(branch).await
    }

    /// Provision, install or update as needed, then start the game and
    /// return its pid. A second call while one is running fails with
    /// [`LauncherError::Busy`].
    #[instrument(skip(self), fields(branch = %version.branch, version = version.version))]
    pub async fn launch(&self, player_name: &str, version: &GameVersion) -> LauncherResult<u32> {
        let _busy = BusyGuard::acquire(&self.busy)?;

        let runtime = self.provision_runtime(&version.branch).await;
        let result = self.install_and_start(player_name, version, runtime).await;
        if let Err(e) = &result {
            warn!("Launch failed: {}", e);
            self.events.status(LaunchStatus::Error(e.to_string()));
        }
        result
    }

    async fn provision_runtime(&self, branch: &str) -> RuntimeSelection {
        match ensure_runtime(
            self.transfer.as_ref(),
            &self.config,
            branch,
            self.events.as_ref(),
        )
        .await
        {
            Ok(path) => RuntimeSelection::Managed(path),
            Err(e) => {
                warn!("Failed to provision runtime, will try system runtime: {}", e);
                self.events
                    .status(LaunchStatus::RuntimeInstallFailed(e.to_string()));
                RuntimeSelection::System(
                    resolve_system_runtime(&self.config.runtime_executable).await,
                )
            }
        }
    }

    async fn install_and_start(
        &self,
        player_name: &str,
        version: &GameVersion,
        runtime: RuntimeSelection,
    ) -> LauncherResult<u32> {
        let state = self.ensure_installed(version).await?;

        if !state.client_present() {
            return Err(LauncherError::NotInstalled {
                path: state.client_path,
            });
        }

        let launch = GameLaunch {
            client_path: state.client_path,
            game_dir: state.game_dir,
            runtime: runtime.path().to_path_buf(),
            user_data_dir: self.config.user_data_dir(),
            identity: self.identities.resolve(player_name),
            player_name: player_name.to_string(),
            log_path: self.config.game_log_path(),
        };
        let pid = tokio::task::spawn_blocking(move || spawn_game(&launch))
            .await
            .map_err(|e| LauncherError::Other(format!("Launch task panicked: {e}")))??;

        self.events.status(LaunchStatus::Launched(pid));
        Ok(pid)
    }

    /// Skip when the recorded ordinal and the client binary both match,
    /// otherwise download and apply the patch for `version`.
    async fn ensure_installed(&self, version: &GameVersion) -> LauncherResult<InstalledState> {
        let state = self.installs.state(&version.branch).await;
        if state.is_current(version.version) {
            info!("Version {} already installed", version.version);
            self.events.status(LaunchStatus::GameInstalled);
            self.events.progress(100.0);
            return Ok(state);
        }

        self.apply_pending_patch(version, &state).await?;
        Ok(self.installs.state(&version.branch).await)
    }

    async fn apply_pending_patch(
        &self,
        version: &GameVersion,
        state: &InstalledState,
    ) -> LauncherResult<()> {
        info!(
            "Installing version {} over {:?}",
            version.version, state.installed_version
        );
        tokio::fs::create_dir_all(&state.game_dir)
            .await
            .map_err(|e| LauncherError::io(&state.game_dir, e))?;

        self.events
            .status(LaunchStatus::DownloadingVersion(version.version));
        let url = self.config.patch_url(&version.branch, version.version);
        let patch_file: PathBuf = self
            .config
            .patch_cache_path(&version.branch, version.version);
        let events = self.events.as_ref();
        let report = |done: u64, total: u64| {
            if let Some(event) = LauncherEvent::transfer(done, total) {
                events.emit(event);
            }
        };
        self.transfer
            .download(&url, &patch_file, Some(&report))
            .await?;

        self.events.status(LaunchStatus::ApplyingPatch);
        self.patcher
            .apply(&patch_file, &state.game_dir, self.events.as_ref())
            .await?;

        self.installs
            .record(&version.branch, version.version)
            .await?;
        self.events.status(LaunchStatus::GameUpdated);
        Ok(())
    }
}

/// Holds the busy flag for the lifetime of one launch.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> LauncherResult<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LauncherError::Busy)?;
        Ok(Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
