// src/error.rs
//! Typed errors for each curation stage.
//!
//! Every fallible step of a run (feed fetch, timestamp parsing, link derivation,
//! filesystem work, document download, page rendering) reports through
//! [`CurateError`]. The driver decides whether an error aborts the run or only
//! drops the affected entry (see [`crate::config::EntryErrorPolicy`]).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurateError {
    #[error("fetching feed from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("parsing feed: {0}")]
    FeedParse(String),

    #[error("malformed updated timestamp {value:?} on {link}: {source}")]
    Timestamp {
        link: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("cannot derive a document id from link: {0}")]
    InvalidLink(String),

    #[error("filesystem error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("downloading {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("rendering page {page} of {}: {reason}", document.display())]
    Render {
        document: PathBuf,
        page: usize,
        reason: String,
    },

    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CurateError {
    /// Short stage label used as a log field and metrics label.
    pub fn stage(&self) -> &'static str {
        match self {
            CurateError::Fetch { .. } | CurateError::HttpStatus { .. } => "fetch",
            CurateError::FeedParse(_) => "parse",
            CurateError::Timestamp { .. } => "timestamp",
            CurateError::InvalidLink(_) => "link",
            CurateError::Io { .. } => "filesystem",
            CurateError::Download { .. } => "download",
            CurateError::Render { .. } | CurateError::Task(_) => "render",
        }
    }

    /// Errors that make the whole feed unusable, regardless of entry policy.
    pub fn is_feed_level(&self) -> bool {
        matches!(
            self,
            CurateError::Fetch { .. } | CurateError::HttpStatus { .. } | CurateError::FeedParse(_)
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CurateError::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_group_related_failures() {
        let e = CurateError::HttpStatus {
            url: "http://x".into(),
            status: 503,
        };
        assert_eq!(e.stage(), "fetch");
        assert!(e.is_feed_level());

        let e = CurateError::Render {
            document: PathBuf::from("/tmp/a.pdf"),
            page: 2,
            reason: "boom".into(),
        };
        assert_eq!(e.stage(), "render");
        assert!(!e.is_feed_level());
        assert!(e.to_string().contains("page 2"));
    }
}
