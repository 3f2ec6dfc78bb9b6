use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;

use super::{ProgressFn, Transfer};

/// Resumable single-stream HTTP downloader.
///
/// Each transfer writes to a sibling `<dest>.tmp` file that is promoted to
/// `dest` only once the body has been fully written. A failed transfer
/// leaves the temp file behind so the next attempt can resume with a
/// `Range` request. Callers must not run two transfers to the same `dest`
/// at once.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    probe_timeout: Duration,
}

impl Downloader {
    pub fn new(probe_timeout: Duration) -> LauncherResult<Self> {
        Ok(Self::with_client(build_http_client()?, probe_timeout))
    }

    pub fn with_client(client: Client, probe_timeout: Duration) -> Self {
        Self {
            client,
            probe_timeout,
        }
    }

    pub fn http_client(&self) -> &Client {
        &self.client
    }

    // ── Presence probe ──────────────────────────────────

    /// Ask for the first byte only. 2xx (including 206) means present;
    /// any other status, timeout or connection error means absent.
    pub async fn probe(&self, url: &str) -> bool {
        let result = self
            .client
            .get(url)
            .header(RANGE, "bytes=0-0")
            .timeout(self.probe_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!("Probe miss for {}: HTTP {}", url, response.status());
                false
            }
            Err(e) => {
                // Indistinguishable from a miss for the caller; keep the
                // reason in the log.
                debug!("Probe request failed for {}: {}", url, e);
                false
            }
        }
    }

    // ── Resumable download ──────────────────────────────

    #[instrument(skip(self, progress))]
    pub async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressFn<'_>>,
    ) -> LauncherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }

        let temp_path = temp_path_for(dest);
        let existing = match tokio::fs::metadata(&temp_path).await {
            Ok(meta) if meta.is_file() => Some(meta.len()),
            _ => None,
        };
        let mut resume_from = existing.unwrap_or(0);

        let mut request = self.client.get(url);
        if resume_from > 0 {
            debug!("Resuming {} from byte {}", url, resume_from);
            request = request.header(RANGE, format!("bytes={resume_from}-"));
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::RANGE_NOT_SATISFIABLE && existing.is_some() {
            // Nothing left to fetch: the temp file already holds everything.
            info!("Range not satisfiable for {}, keeping {:?}", url, temp_path);
            return promote(&temp_path, dest).await;
        }

        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        if resume_from > 0 && status != StatusCode::PARTIAL_CONTENT {
            debug!(
                "Server ignored range for {} (HTTP {}), restarting from zero",
                url, status
            );
            remove_if_exists(&temp_path).await?;
            resume_from = 0;
        }

        let total = resume_from + response.content_length().unwrap_or(0);

        let mut options = tokio::fs::OpenOptions::new();
        options.create(true);
        if resume_from > 0 {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let mut file = options
            .open(&temp_path)
            .await
            .map_err(|e| LauncherError::io(&temp_path, e))?;

        let mut downloaded = resume_from;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LauncherError::Transfer {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| LauncherError::Transfer {
                    url: url.to_string(),
                    reason: format!("write to {:?} failed: {e}", temp_path),
                })?;

            downloaded += chunk.len() as u64;
            if let Some(report) = progress {
                if total > 0 {
                    report(downloaded, total);
                }
            }
        }

        file.flush().await.map_err(|e| LauncherError::Transfer {
            url: url.to_string(),
            reason: format!("flush of {:?} failed: {e}", temp_path),
        })?;
        // Handle must be closed before the rename on Windows.
        drop(file);

        promote(&temp_path, dest).await?;
        debug!("Downloaded {} -> {:?} ({} bytes)", url, dest, downloaded);
        Ok(())
    }

    pub async fn get_json(&self, url: &str) -> LauncherResult<serde_json::Value> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Transfer for Downloader {
    async fn exists(&self, url: &str) -> bool {
        self.probe(url).await
    }

    async fn download(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressFn<'_>>,
    ) -> LauncherResult<()> {
        self.download_file(url, dest, progress).await
    }

    async fn fetch_json(&self, url: &str) -> LauncherResult<serde_json::Value> {
        self.get_json(url).await
    }
}

/// `<dest>.tmp`, next to the destination.
pub fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name: OsString = dest.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

async fn promote(temp_path: &Path, dest: &Path) -> LauncherResult<()> {
    remove_if_exists(dest).await?;
    tokio::fs::rename(temp_path, dest)
        .await
        .map_err(|e| LauncherError::io(dest, e))
}

async fn remove_if_exists(path: &Path) -> LauncherResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LauncherError::io(path, e)),
    }
}
