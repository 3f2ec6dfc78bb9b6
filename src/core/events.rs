// ─── Events ───
// Status and progress reporting. The core only emits; whoever drives it
// (CLI, a GUI shell, tests) decides what to do with the events.

use std::fmt;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

/// Human-facing status of the current operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum LaunchStatus {
    CheckingVersions,
    RuntimeInstalled,
    DownloadingRuntime,
    ExtractingRuntime,
    RuntimeReady,
    RuntimeInstallFailed(String),
    GameInstalled,
    DownloadingVersion(u32),
    DownloadingPatchTool,
    ExtractingPatchTool,
    ApplyingPatch,
    GameUpdated,
    Launched(u32),
    Error(String),
}

impl fmt::Display for LaunchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaunchStatus::CheckingVersions => write!(f, "Checking available versions..."),
            LaunchStatus::RuntimeInstalled => write!(f, "Java runtime already installed"),
            LaunchStatus::DownloadingRuntime => write!(f, "Downloading Java runtime..."),
            LaunchStatus::ExtractingRuntime => write!(f, "Extracting Java runtime..."),
            LaunchStatus::RuntimeReady => write!(f, "Java runtime installed"),
            LaunchStatus::RuntimeInstallFailed(msg) => {
                write!(f, "Java runtime install failed: {msg}")
            }
            LaunchStatus::GameInstalled => write!(f, "Game is up to date"),
            LaunchStatus::DownloadingVersion(v) => write!(f, "Downloading version {v}..."),
            LaunchStatus::DownloadingPatchTool => write!(f, "Downloading patch tool..."),
            LaunchStatus::ExtractingPatchTool => write!(f, "Extracting patch tool..."),
            LaunchStatus::ApplyingPatch => write!(f, "Applying patch..."),
            LaunchStatus::GameUpdated => write!(f, "Game installed successfully"),
            LaunchStatus::Launched(pid) => write!(f, "Game launched (pid {pid})"),
            LaunchStatus::Error(msg) => write!(f, "Error: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LauncherEvent {
    Status { status: LaunchStatus },
    Progress { percent: f32 },
}

impl LauncherEvent {
    pub fn status(status: LaunchStatus) -> Self {
        LauncherEvent::Status { status }
    }

    /// Percentage clamped to `0..=100`.
    pub fn progress(percent: f32) -> Self {
        LauncherEvent::Progress {
            percent: percent.clamp(0.0, 100.0),
        }
    }

    /// Byte progress of a transfer. `None` when the total is unknown.
    pub fn transfer(downloaded: u64, total: u64) -> Option<Self> {
        if total == 0 {
            return None;
        }
        Some(Self::progress(downloaded as f32 / total as f32 * 100.0))
    }
}

/// Receiver of status and progress events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LauncherEvent);

    fn status(&self, status: LaunchStatus) {
        self.emit(LauncherEvent::status(status));
    }

    fn progress(&self, percent: f32) {
        self.emit(LauncherEvent::progress(percent));
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: LauncherEvent) {}
}

/// Logs status changes; progress is too chatty for the log and is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: LauncherEvent) {
        if let LauncherEvent::Status { status } = event {
            info!("{}", status);
        }
    }
}

/// Forwards events into an unbounded channel. A closed receiver is ignored.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LauncherEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LauncherEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: LauncherEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Sink that keeps every event for later assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<LauncherEvent>>,
    }

    impl RecordingSink {
        pub fn events(&self) -> Vec<LauncherEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn statuses(&self) -> Vec<LaunchStatus> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    LauncherEvent::Status { status } => Some(status),
                    LauncherEvent::Progress { .. } => None,
                })
                .collect()
        }

        pub fn progress_values(&self) -> Vec<f32> {
            self.events()
                .into_iter()
                .filter_map(|event| match event {
                    LauncherEvent::Progress { percent } => Some(percent),
                    LauncherEvent::Status { .. } => None,
                })
                .collect()
        }
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: LauncherEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_clamped() {
        assert_eq!(
            LauncherEvent::progress(140.0),
            LauncherEvent::Progress { percent: 100.0 }
        );
        assert_eq!(
            LauncherEvent::progress(-3.0),
            LauncherEvent::Progress { percent: 0.0 }
        );
    }

    #[test]
    fn transfer_progress_needs_a_total() {
        assert_eq!(LauncherEvent::transfer(10, 0), None);
        assert_eq!(
            LauncherEvent::transfer(25, 100),
            Some(LauncherEvent::Progress { percent: 25.0 })
        );
    }

    #[tokio::test]
    async fn channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.status(LaunchStatus::CheckingVersions);
        sink.progress(50.0);
        drop(sink);

        assert_eq!(
            rx.recv().await,
            Some(LauncherEvent::status(LaunchStatus::CheckingVersions))
        );
        assert_eq!(rx.recv().await, Some(LauncherEvent::progress(50.0)));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn status_serializes_with_detail() {
        let json = serde_json::to_value(LauncherEvent::status(LaunchStatus::DownloadingVersion(4)))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "status",
                "status": { "status": "downloading_version", "detail": 4 }
            })
        );
    }
}
