// src/artifacts/mock.rs
//! In-process stand-ins for the download and render backends.
//!
//! Requires feature `test-support` (enabled for this crate's own tests).
//! Nothing here touches the network or PDFium.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::artifacts::fetch::DocumentFetcher;
use crate::artifacts::preview_path;
use crate::artifacts::render::PageRenderer;
use crate::error::CurateError;

/// Writes a placeholder document instead of downloading; counts calls.
pub struct MockDocumentFetcher {
    pub calls: AtomicUsize,
    fail: bool,
}

impl MockDocumentFetcher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockDocumentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentFetcher for MockDocumentFetcher {
    async fn download(
        &self,
        url: &str,
        dest_dir: &Path,
        file_stem: &str,
    ) -> Result<PathBuf, CurateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CurateError::Download {
                url: url.to_string(),
                reason: "mock failure".into(),
            });
        }
        let path = dest_dir.join(format!("{file_stem}.pdf"));
        tokio::fs::write(&path, b"%PDF-1.4 mock")
            .await
            .map_err(|e| CurateError::io(&path, e))?;
        Ok(path)
    }
}

/// Writes placeholder previews for a fixed page count.
///
/// `fail_after` makes the renderer write that many pages and then error,
/// which models a render that dies partway through a document.
pub struct MockPageRenderer {
    page_count: usize,
    fail_after: Option<usize>,
    pub calls: AtomicUsize,
}

impl MockPageRenderer {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            fail_after: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_after(page_count: usize, fail_after: usize) -> Self {
        Self {
            page_count,
            fail_after: Some(fail_after),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageRenderer for MockPageRenderer {
    fn render_pages(
        &self,
        document: &Path,
        out_dir: &Path,
        max_pages: usize,
    ) -> Result<usize, CurateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let count = self.page_count.min(max_pages);
        for index in 0..count {
            if self.fail_after == Some(index) {
                return Err(CurateError::Render {
                    document: document.to_path_buf(),
                    page: index,
                    reason: "mock failure".into(),
                });
            }
            let path = preview_path(out_dir, index);
            std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xD9]).map_err(|e| CurateError::io(&path, e))?;
        }
        Ok(count)
    }
}
