//! Fetch a document's PDF to a path derived from its id.
//!
//! arXiv ids may contain a `/` (e.g. `cs/0412050v1`); it is replaced with
//! `__` so every paper lands directly in the download directory.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::config::DownloadConfig;

pub struct PdfDownloader {
    client: reqwest::Client,
    base_url: String,
    dir: PathBuf,
}

/// File name for `id`: path separators replaced by `__`, `.pdf` appended.
pub fn file_name_for(id: &str) -> String {
    format!("{}.pdf", id.replace(['/', '\\'], "__"))
}

impl PdfDownloader {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            dir: config.dir.clone(),
        })
    }

    pub fn target_path(&self, id: &str) -> PathBuf {
        self.dir.join(file_name_for(id))
    }

    /// Download `{base_url}/pdf/{id}` and return where it was written.
    pub async fn fetch(&self, id: &str) -> Result<PathBuf> {
        let url = format!("{}/pdf/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Download failed: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Download failed: {} returned {}", url, status);
        }
        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read download body: {}", url))?;

        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create download directory: {}", self.dir.display()))?;
        let path = self.target_path(id);
        std::fs::write(&path, &bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::info!(bytes = bytes.len(), "downloaded {} to {}", id, path.display());
        Ok(path)
    }
}
