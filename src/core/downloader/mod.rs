pub mod client;

use std::path::Path;

use async_trait::async_trait;

use crate::core::error::LauncherResult;

pub use client::{temp_path_for, Downloader};

/// Byte progress callback: `(bytes_so_far, total_bytes)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, u64) + Send + Sync);

/// Remote object access used by discovery, provisioning and patching.
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Cheap presence check. Any failure counts as absent.
    async fn exists(&self, url: &str) -> bool;

    /// Resumable fetch of `url` into `dest`.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressFn<'_>>,
    ) -> LauncherResult<()>;

    /// GET a small JSON document.
    async fn fetch_json(&self, url: &str) -> LauncherResult<serde_json::Value>;
}
