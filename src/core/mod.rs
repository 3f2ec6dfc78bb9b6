// ─── TaleLauncher Core ───
// Patch-based game installer, updater and launcher.
//
// Architecture:
//   core/
//     downloader/ - Presence probes + resumable transfers
//     version/    - Version discovery by probing patch ordinals
//     java/       - Managed runtime provisioning + system fallback
//     patch/      - Self-provisioning patch tool invocation
//     instance/   - Per-branch install state (version marker)
//     launch/     - Orchestrator + detached process spawner
//     state/      - Identities, settings, application wiring
//     archive.rs  - Zip extraction + single-wrapper flattening
//     config.rs   - Paths, endpoints, thresholds
//     events.rs   - Status/progress reporting

pub mod archive;
pub mod config;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod instance;
pub mod java;
pub mod launch;
pub mod patch;
pub mod platform;
pub mod state;
pub mod version;
