// src/feed/types.rs
use crate::error::CurateError;

/// One upstream entry, normalized across Atom and RSS.
///
/// Timestamps are kept as the feed wrote them; curation parses `updated`
/// and treats a malformed value as an error for that entry.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String, // abstract page URL
    pub description: String,
    pub published: String,
    pub updated: String,
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self) -> Result<Vec<FeedEntry>, CurateError>;
    fn name(&self) -> &str;
}
