// src/artifacts/mod.rs
//! Per-document preview cache.
//!
//! Each document gets a directory under the papers root, keyed by its id. The
//! directory's existence is the idempotency marker: once it exists the
//! document is treated as processed and never downloaded or rendered again.
//! A `.complete` sentinel is written last on every successful run; with
//! `require_completion_marker` a directory missing it is materialized again.

pub mod fetch;
#[cfg(any(test, feature = "test-support"))]
pub mod mock;
pub mod render;

use metrics::counter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::artifacts::fetch::DocumentFetcher;
use crate::artifacts::render::PageRenderer;
use crate::error::CurateError;

pub const COMPLETION_MARKER: &str = ".complete";

/// Path of the `index`-th preview (0-based) inside a document directory.
pub fn preview_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{index}.jpg"))
}

/// Identity and location of one document's previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    pub id: String,
    pub dir: PathBuf,
}

impl ArtifactRecord {
    /// Derive the record from a document link: the id is the link's last path segment.
    pub fn from_document_link(link: &str, papers_root: &Path) -> Result<Self, CurateError> {
        let id = document_id(link)?;
        Ok(Self {
            dir: papers_root.join(&id),
            id,
        })
    }

    /// Relative URL path of the `index`-th preview, e.g. `papers/2301.00001v2/0.jpg`.
    pub fn preview_rel_url(&self, papers_dir: &str, index: usize) -> String {
        format!(
            "{}/{}/{index}.jpg",
            papers_dir.trim_matches('/'),
            self.id
        )
    }
}

/// Last non-empty path segment of `link`, rejected if it could escape the papers root.
pub fn document_id(link: &str) -> Result<String, CurateError> {
    let url = reqwest::Url::parse(link).map_err(|_| CurateError::InvalidLink(link.to_string()))?;
    let segment = url
        .path_segments()
        .and_then(|segs| segs.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| CurateError::InvalidLink(link.to_string()))?;

    // Prevent path traversal
    if segment == "." || segment == ".." || segment.contains('\\') || segment.contains('%') {
        return Err(CurateError::InvalidLink(link.to_string()));
    }
    Ok(segment.to_string())
}

/// Outcome of [`ArtifactCache::ensure_materialized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Materialization {
    /// Directory already present; nothing was done.
    Cached,
    /// Document downloaded and `pages` previews written.
    Rendered { pages: usize },
}

#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub max_pages: usize,
    pub require_completion_marker: bool,
}

pub struct ArtifactCache {
    fetcher: Arc<dyn DocumentFetcher>,
    renderer: Arc<dyn PageRenderer>,
    opts: CacheOptions,
}

impl ArtifactCache {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        renderer: Arc<dyn PageRenderer>,
        opts: CacheOptions,
    ) -> Self {
        Self {
            fetcher,
            renderer,
            opts,
        }
    }

    fn is_materialized(&self, output_dir: &Path) -> bool {
        if !output_dir.exists() {
            return false;
        }
        !self.opts.require_completion_marker || output_dir.join(COMPLETION_MARKER).exists()
    }

    /// Download `document_link` and render its leading pages into `output_dir`,
    /// unless that directory already exists.
    ///
    /// The downloaded document is deleted after rendering; only previews remain.
    /// Errors are returned as-is: no retry, and a directory created before the
    /// failure stays in place.
    pub async fn ensure_materialized(
        &self,
        document_link: &str,
        output_dir: &Path,
    ) -> Result<Materialization, CurateError> {
        if self.is_materialized(output_dir) {
            tracing::debug!(dir = %output_dir.display(), "artifacts already present");
            counter!("artifacts_cached_total").increment(1);
            return Ok(Materialization::Cached);
        }

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| CurateError::io(output_dir, e))?;

        let stem = output_dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".into());

        tracing::info!(url = document_link, "downloading document");
        let document = self
            .fetcher
            .download(document_link, output_dir, &stem)
            .await?;

        tracing::info!(max_pages = self.opts.max_pages, "rendering page previews");
        let renderer = Arc::clone(&self.renderer);
        let (doc, dir, max_pages) = (
            document.clone(),
            output_dir.to_path_buf(),
            self.opts.max_pages,
        );
        let rendered =
            tokio::task::spawn_blocking(move || renderer.render_pages(&doc, &dir, max_pages))
                .await
                .map_err(CurateError::from)
                .and_then(|r| r);
        let pages = match rendered {
            Ok(pages) => pages,
            Err(e) => {
                // only previews may remain in the directory
                if let Err(rm) = tokio::fs::remove_file(&document).await {
                    tracing::warn!(path = %document.display(), error = %rm, "could not remove document after render failure");
                }
                return Err(e);
            }
        };

        tracing::info!(path = %document.display(), "removing downloaded document");
        tokio::fs::remove_file(&document)
            .await
            .map_err(|e| CurateError::io(&document, e))?;

        let marker = output_dir.join(COMPLETION_MARKER);
        tokio::fs::write(&marker, b"")
            .await
            .map_err(|e| CurateError::io(&marker, e))?;

        counter!("artifacts_materialized_total").increment(1);
        counter!("artifacts_pages_rendered_total").increment(pages as u64);
        Ok(Materialization::Rendered { pages })
    }

    /// Previews of `record` present on disk right now, in page order.
    ///
    /// Existence is checked per file rather than taken from the last render,
    /// so a partially rendered directory yields only the pages that exist.
    pub fn existing_previews(&self, record: &ArtifactRecord) -> Vec<usize> {
        (0..self.opts.max_pages)
            .filter(|&i| preview_path(&record.dir, i).is_file())
            .collect()
    }
}
