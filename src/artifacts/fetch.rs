// src/artifacts/fetch.rs
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::CurateError;

/// Downloads a source document into a directory and returns the written path.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, CurateError>;
}

/// Fetches documents over HTTP with the shared client (browser-like User-Agent).
pub struct HttpDocumentFetcher {
    client: reqwest::Client,
}

impl HttpDocumentFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentFetcher for HttpDocumentFetcher {
    async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, CurateError> {
        let download_err = |reason: String| CurateError::Download {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(download_err(format!("HTTP {}", response.status().as_u16())));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| download_err(e.to_string()))?;

        let local_path = dest_dir.join(format!("{file_stem}.pdf"));
        let tmp_path = local_path.with_extension("pdf.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|e| CurateError::io(&tmp_path, e))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &local_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(CurateError::io(&local_path, e));
        }

        tracing::debug!(url, bytes = bytes.len(), path = %local_path.display(), "document saved");
        Ok(local_path)
    }
}
