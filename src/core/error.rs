use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Transfer of {url} failed: {reason}")]
    Transfer { url: String, reason: String },

    // ── Runtime ─────────────────────────────────────────
    #[error("Runtime manifest error: {0}")]
    Manifest(String),

    #[error("Extraction failed: {path:?} still not found")]
    Extraction { path: PathBuf },

    // ── Patch tool ──────────────────────────────────────
    #[error("Failed to start patch tool: {0}")]
    PatchToolSpawn(String),

    #[error("Patch tool error (code {code}): {output}")]
    PatchTool { code: i32, output: String },

    // ── Launch ──────────────────────────────────────────
    #[error("Game is not installed: {path:?}")]
    NotInstalled { path: PathBuf },

    #[error("Failed to start game process: {0}")]
    GameSpawn(String),

    #[error("A launch is already in progress")]
    Busy,

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// ── Serialization for IPC / JSON output ─────────────────
// Callers surface the message verbatim.
impl serde::Serialize for LauncherError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_tool_error_carries_output_in_message() {
        let err = LauncherError::PatchTool {
            code: 2,
            output: "corrupt patch".into(),
        };
        assert_eq!(err.to_string(), "Patch tool error (code 2): corrupt patch");
    }

    #[test]
    fn serializes_as_display_string() {
        let err = LauncherError::Manifest("no entry for linux/amd64".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Runtime manifest error: no entry for linux/amd64\"");
    }
}
