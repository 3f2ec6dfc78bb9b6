// ─── Version Discovery ───
// There is no version index upstream: versions are found by probing
// `{patch_base}/{branch}/0/{n}.pwr` for n = 1, 2, ... until a run of
// consecutive misses.

use tracing::{debug, info, instrument};

use crate::core::config::LauncherConfig;
use crate::core::downloader::Transfer;
use crate::core::events::{EventSink, LaunchStatus};

use super::GameVersion;

/// Scan the branch and return the selectable versions, never empty.
///
/// Probe failures count as misses, so a run of transient errors ends the
/// scan early exactly like a run of missing ordinals.
#[instrument(skip(transfer, config, events))]
pub async fn discover_versions(
    transfer: &dyn Transfer,
    config: &LauncherConfig,
    branch: &str,
    events: &dyn EventSink,
) -> Vec<GameVersion> {
    events.status(LaunchStatus::CheckingVersions);
    let threshold = config.consecutive_misses_to_stop.max(1);

    let mut consecutive_misses = 0;
    let mut ordinal: u32 = 1;
    let mut max_found: u32 = 0;

    while consecutive_misses < threshold {
        let url = config.patch_url(branch, ordinal);
        let exists = transfer.exists(&url).await;
        debug!("Version {} exists: {}", ordinal, exists);

        if exists {
            max_found = ordinal;
            consecutive_misses = 0;
        } else {
            consecutive_misses += 1;
        }

        events.progress(ordinal.saturating_mul(5).min(100) as f32);
        ordinal += 1;
    }

    info!("Highest version found on {}: {}", branch, max_found);
    events.progress(100.0);
    build_version_list(branch, max_found)
}

/// `Latest(max)` followed by `Version 1..=max`; a single `Latest(1)` when
/// nothing was found.
pub fn build_version_list(branch: &str, max_found: u32) -> Vec<GameVersion> {
    if max_found == 0 {
        debug!("No versions found on {}, using fallback", branch);
        return vec![GameVersion::latest(1, branch)];
    }

    std::iter::once(GameVersion::latest(max_found, branch))
        .chain((1..=max_found).map(|v| GameVersion::numbered(v, branch)))
        .collect()
}
